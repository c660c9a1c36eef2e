use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt;
use std::net::IpAddr;

use crate::tokens::MAX_TOKEN_TTL_SECONDS;

const DEFAULT_DATABASE_URL: &str = "sqlite://prepsheet.db";
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_JWT_LEEWAY_SECONDS: u64 = 0;

#[derive(Clone)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    /// Clock skew tolerated when checking token expiry.
    pub jwt_leeway_seconds: u64,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    load_service_config_from(|key| env::var(key).ok())
}

/// Builds the config from an arbitrary key lookup so tests need not touch the process env.
pub fn load_service_config_from<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let host = match lookup("HOST").and_then(|value| normalize_optional(&value)) {
        Some(value) => value
            .parse::<IpAddr>()
            .with_context(|| format!("Failed to parse HOST '{value}'"))?,
        None => IpAddr::from([0, 0, 0, 0]),
    };

    let port = parse_or_default(&lookup, "PORT", DEFAULT_PORT)?;
    let db_max_connections =
        parse_or_default(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
    if db_max_connections == 0 {
        return Err(anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
    }

    let database_url = lookup("DATABASE_URL")
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    let jwt_secret = lookup("JWT_SECRET")
        .and_then(|value| normalize_optional(&value))
        .ok_or_else(|| anyhow!("JWT_SECRET must be set"))?;

    let token_ttl_seconds = parse_or_default(&lookup, "JWT_TTL_SECONDS", DEFAULT_TOKEN_TTL_SECONDS)?;
    if token_ttl_seconds <= 0 {
        return Err(anyhow!("JWT_TTL_SECONDS must be positive"));
    }
    if token_ttl_seconds > MAX_TOKEN_TTL_SECONDS {
        return Err(anyhow!(
            "JWT_TTL_SECONDS must not exceed {MAX_TOKEN_TTL_SECONDS}"
        ));
    }
    let jwt_leeway_seconds =
        parse_or_default(&lookup, "JWT_LEEWAY_SECONDS", DEFAULT_JWT_LEEWAY_SECONDS)?;

    let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
        .map(|value| parse_origins(&value))
        .unwrap_or_default();

    Ok(ServiceConfig {
        host,
        port,
        database_url,
        db_max_connections,
        jwt_secret,
        token_ttl_seconds,
        jwt_leeway_seconds,
        cors_allowed_origins,
    })
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).and_then(|value| normalize_optional(&value)) {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("Failed to parse {key} '{value}'")),
        None => Ok(default),
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == ';' || c == ' ')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(str::to_string)
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
