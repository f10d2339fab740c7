//! Authentication primitives for natter.
//!
//! - **Passwords**: Argon2id hashing and verification
//! - **JWT**: HS256 tokens signed with a shared server secret

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    HashError(String),
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    #[error("signing secret must not be empty")]
    EmptySecret,
}

// ── Password Hashing (Argon2id) ─────────────────────────────────────

/// Hash a password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against an Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    use argon2::{Argon2, PasswordVerifier, password_hash::PasswordHash};

    let parsed_hash = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// ── JWT (HS256) ─────────────────────────────────────────────────────

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the caller's user ID. Tokens minted by older clients carry
    /// it under `id`.
    #[serde(alias = "id")]
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued-at time (Unix timestamp).
    #[serde(default)]
    pub iat: i64,
}

/// JWT signing/verification context bound to one shared secret.
#[derive(Clone)]
pub struct JwtContext {
    encoding_key: jsonwebtoken::EncodingKey,
    decoding_key: jsonwebtoken::DecodingKey,
}

impl JwtContext {
    pub fn from_secret(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        Ok(Self {
            encoding_key: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Create and sign a token.
    pub fn create_token(&self, claims: &Claims) -> Result<String, AuthError> {
        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256);
        Ok(jsonwebtoken::encode(&header, claims, &self.encoding_key)?)
    }

    /// Issue a token for `user_id` valid for `ttl_secs` from now.
    pub fn issue(&self, user_id: &str, ttl_secs: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        self.create_token(&Claims {
            sub: user_id.to_owned(),
            exp: now + ttl_secs,
            iat: now,
        })
    }

    /// Validate signature and expiry, then decode the claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_and_verify() {
        let hash = hash_password("test-password-123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("test-password-123", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn jwt_issue_and_verify() {
        let ctx = JwtContext::from_secret("unit-test-secret").unwrap();
        let token = ctx.issue("usr_test123", 3600).unwrap();
        let recovered = ctx.verify_token(&token).unwrap();
        assert_eq!(recovered.sub, "usr_test123");
    }

    #[test]
    fn jwt_expired_token_rejected() {
        let ctx = JwtContext::from_secret("unit-test-secret").unwrap();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "usr_test".into(),
            exp: now - 100,
            iat: now - 200,
        };

        let token = ctx.create_token(&claims).unwrap();
        assert!(ctx.verify_token(&token).is_err());
    }

    #[test]
    fn jwt_wrong_secret_rejected() {
        let ctx1 = JwtContext::from_secret("secret-one").unwrap();
        let ctx2 = JwtContext::from_secret("secret-two").unwrap();

        let token = ctx1.issue("usr_test", 3600).unwrap();
        assert!(ctx2.verify_token(&token).is_err());
    }

    #[test]
    fn jwt_garbage_rejected() {
        let ctx = JwtContext::from_secret("unit-test-secret").unwrap();
        assert!(ctx.verify_token("not.a.jwt").is_err());
        assert!(ctx.verify_token("").is_err());
    }

    #[test]
    fn legacy_id_claim_is_accepted() {
        let ctx = JwtContext::from_secret("unit-test-secret").unwrap();
        let exp = Utc::now().timestamp() + 600;
        let legacy = serde_json::json!({ "id": "usr_legacy", "exp": exp });
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &legacy,
            &jsonwebtoken::EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        assert_eq!(ctx.verify_token(&token).unwrap().sub, "usr_legacy");
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            JwtContext::from_secret(""),
            Err(AuthError::EmptySecret)
        ));
    }
}
