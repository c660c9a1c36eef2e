use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use common_auth::Role;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Upper bound on token lifetime: ten years.
pub const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

pub struct TokenConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

/// Issues HS256 bearer tokens verifiable by `common_auth::JwtVerifier` with the same secret.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    ttl: Duration,
}

pub struct TokenSubject<'a> {
    pub user_id: i64,
    pub username: &'a str,
    pub role: Role,
}

#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AccessClaims<'a> {
    user_id: i64,
    username: &'a str,
    role: &'a str,
    iat: i64,
    exp: i64,
}

impl TokenSigner {
    pub fn new(config: TokenConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(anyhow!("Token signing secret must not be empty"));
        }
        if config.ttl_seconds <= 0 {
            return Err(anyhow!("Token TTL must be positive"));
        }
        if config.ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(anyhow!(
                "Token TTL must not exceed {MAX_TOKEN_TTL_SECONDS} seconds"
            ));
        }
        let ttl = Duration::try_seconds(config.ttl_seconds)
            .ok_or_else(|| anyhow!("Token TTL is out of range"))?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            ttl,
        })
    }

    pub fn issue(&self, subject: TokenSubject<'_>) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow!("Token expiry is out of range"))?;

        let claims = AccessClaims {
            user_id: subject.user_id,
            username: subject.username,
            role: subject.role.as_str(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| anyhow!("Failed to sign access token: {err}"))?;

        Ok(IssuedToken { token, expires_at })
    }
}
