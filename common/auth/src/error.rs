use axum::response::{IntoResponse, Response};
use common_http_errors::ApiError;
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Failures produced while turning an `Authorization` header into an identity.
///
/// The `Display` text carries diagnostic detail for logs; clients only ever see
/// [`AuthError::client_message`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingCredential,
    #[error("authorization header malformed")]
    MalformedCredential,
    #[error("token signature rejected: {0}")]
    InvalidSignature(String),
    #[error("token expired")]
    Expired,
    #[error("malformed claim payload: {0}")]
    MalformedClaims(String),
    #[error("token signing secret must not be empty")]
    EmptySecret,
}

impl AuthError {
    pub fn client_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "Authorization header is required",
            AuthError::MalformedCredential => "Authorization header must be: Bearer <token>",
            AuthError::InvalidSignature(_) | AuthError::Expired => "Invalid or expired token",
            AuthError::MalformedClaims(_) => "Invalid token claims",
            AuthError::EmptySecret => "Authentication is not configured",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential | AuthError::MalformedCredential => "auth_header",
            AuthError::InvalidSignature(_) | AuthError::Expired => "auth_token",
            AuthError::MalformedClaims(_) => "auth_claims",
            AuthError::EmptySecret => "auth_config",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::InvalidSignature(value.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::EmptySecret => ApiError::internal(value.client_message()),
            other => ApiError::unauthorized(other.code(), other.client_message()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
