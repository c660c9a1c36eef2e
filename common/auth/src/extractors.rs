use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderValue};
use serde::Serialize;
use tracing::debug;

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::roles::Role;
use crate::verifier::JwtVerifier;

/// Identity of the caller for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthenticatedIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Turns a raw `Authorization` header value into a verified identity.
pub fn authenticate(
    verifier: &JwtVerifier,
    header_value: Option<&HeaderValue>,
) -> AuthResult<AuthenticatedIdentity> {
    let header_value = header_value
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredential)?;
    let token = parse_bearer(header_value)?;
    let claims = verifier.verify(token)?;
    Ok(claims.into())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);
        authenticate(&verifier, parts.headers.get(AUTHORIZATION)).map_err(|err| {
            debug!(error = %err, "rejecting request credential");
            err
        })
    }
}

/// Accepts exactly `Bearer <token>`: two parts separated by a single space.
fn parse_bearer(value: &HeaderValue) -> AuthResult<&str> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    let mut parts = raw.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}
