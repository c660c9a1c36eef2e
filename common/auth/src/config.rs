use std::fmt;

/// Runtime configuration for HS256 token verification.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared secret used to sign and verify tokens.
    pub secret: String,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u64,
}

impl JwtConfig {
    /// Construct config with no leeway; tokens expire exactly at `exp`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            leeway_seconds: 0,
        }
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}
