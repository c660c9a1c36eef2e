use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

/// The only algorithm accepted for bearer tokens.
pub const EXPECTED_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }

        let key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(EXPECTED_ALGORITHM);
        validation.leeway = config.leeway_seconds;

        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        // `alg: none` does not parse as a jsonwebtoken Algorithm and fails here.
        let header = decode_header(token)
            .map_err(|err| AuthError::InvalidSignature(format!("unreadable header: {err}")))?;
        if header.alg != EXPECTED_ALGORITHM {
            return Err(AuthError::InvalidSignature(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }

        let token_data = decode::<Value>(token, &self.key, &self.validation)?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(user_id = claims.user_id, "verified JWT successfully");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use serde_json::json;

    use crate::roles::Role;

    const SECRET: &str = "unit-test-secret";

    #[derive(Serialize)]
    struct TokenClaims<'a> {
        user_id: i64,
        username: &'a str,
        role: &'a str,
        exp: i64,
        iat: i64,
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(JwtConfig::new(SECRET)).expect("verifier")
    }

    fn issue_token(algorithm: Algorithm, secret: &str, exp_offset: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            user_id: 11,
            username: "casey",
            role: "manager",
            exp: now + exp_offset,
            iat: now,
        };
        encode(
            &Header::new(algorithm),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("sign token")
    }

    #[test]
    fn rejects_empty_secret() {
        let err = JwtVerifier::new(JwtConfig::new("")).err().expect("empty secret");
        assert!(matches!(err, AuthError::EmptySecret));
    }

    #[test]
    fn verifier_accepts_valid_token() {
        let token = issue_token(Algorithm::HS256, SECRET, 600);
        let claims = verifier().verify(&token).expect("verification succeeds");
        assert_eq!(claims.user_id, 11);
        assert_eq!(claims.username, "casey");
        assert_eq!(claims.role, Role::Manager);
    }

    #[test]
    fn verifier_rejects_wrong_secret() {
        let token = issue_token(Algorithm::HS256, "someone-else", 600);
        let err = verifier().verify(&token).expect_err("bad signature");
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[test]
    fn verifier_rejects_other_hmac_algorithms() {
        let token = issue_token(Algorithm::HS512, SECRET, 600);
        let err = verifier().verify(&token).expect_err("HS512 is not accepted");
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[test]
    fn verifier_rejects_alg_none() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({
                "user_id": 1,
                "username": "mallory",
                "role": "manager",
                "exp": Utc::now().timestamp() + 600
            })
            .to_string(),
        );
        let token = format!("{header}.{payload}.");
        let err = verifier().verify(&token).expect_err("unsigned token");
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[test]
    fn verifier_reports_expiry() {
        let token = issue_token(Algorithm::HS256, SECRET, -120);
        let err = verifier().verify(&token).expect_err("expired");
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn leeway_tolerates_recent_expiry() {
        let token = issue_token(Algorithm::HS256, SECRET, -5);
        let verifier = JwtVerifier::new(JwtConfig::new(SECRET).with_leeway(30)).expect("verifier");
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn verifier_rejects_garbage() {
        let err = verifier().verify("garbage").expect_err("not a jwt");
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[test]
    fn signed_payload_missing_claims_is_malformed() {
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"username": "casey", "exp": now + 600}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("sign token");
        let err = verifier().verify(&token).expect_err("missing claims");
        assert!(matches!(err, AuthError::MalformedClaims(_)));
    }
}
