//! HS256 session token issuance and verification.
//!
//! The verifier is a trait so the API middleware can take `Arc<dyn
//! JwtVerifier>` and tests can substitute a failing implementation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use atrium_core::UserId;

use crate::claims::{Claims, validate_claims};

/// Session lifetime: 7 days.
pub const SESSION_TTL: Duration = Duration::days(7);

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("invalid token")]
    Invalid,

    #[error("token encoding failed: {0}")]
    Encode(String),
}

/// Verifies a bearer token and extracts the subject. Fails closed: any
/// malformation, bad signature, or stale window is [`JwtError::Invalid`].
pub trait JwtVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError>;
}

/// HMAC-SHA256 signer/verifier over a shared secret from config.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256Jwt {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Mint a session token with `user_id` as subject, valid for
    /// [`SESSION_TTL`] from `now`.
    pub fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + SESSION_TTL).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::Encode(e.to_string()))
    }
}

impl JwtVerifier for Hs256Jwt {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock below.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| JwtError::Invalid)?;

        validate_claims(&data.claims, now).map_err(|_| JwtError::Invalid)?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_same_subject() {
        let jwt = Hs256Jwt::new(b"test-secret");
        let user = UserId::new();
        let now = Utc::now();

        let token = jwt.issue(user, now).unwrap();
        let claims = jwt.verify(&token, now).unwrap();

        assert_eq!(claims.sub, user);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let jwt = Hs256Jwt::new(b"test-secret");
        assert!(jwt.verify("not.a.jwt", Utc::now()).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signer = Hs256Jwt::new(b"secret-a");
        let verifier = Hs256Jwt::new(b"secret-b");
        let now = Utc::now();

        let token = signer.issue(UserId::new(), now).unwrap();
        assert!(verifier.verify(&token, now).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = Hs256Jwt::new(b"test-secret");
        let now = Utc::now();

        let token = jwt.issue(UserId::new(), now).unwrap();
        assert!(jwt.verify(&token, now + SESSION_TTL + Duration::hours(1)).is_err());
    }
}
