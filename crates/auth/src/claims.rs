//! Bearer token claims model (transport-agnostic).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use atrium_core::UserId;

/// The claims carried in every session token.
///
/// The subject is the authenticated user id; everything else about the
/// identity (workspace membership, system type) is resolved per request
/// against the store, never trusted from the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user.
    pub sub: UserId,

    /// Issued-at (seconds since epoch).
    pub iat: i64,

    /// Expiration (seconds since epoch).
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the claims time window.
///
/// Signature verification is the concern of [`crate::jwt`]; this checks the
/// claims only, so it can be unit-tested without key material.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if claims.iat > now.timestamp() {
        return Err(TokenValidationError::NotYetValid);
    }
    if claims.exp <= now.timestamp() {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_at(iat: DateTime<Utc>, exp: DateTime<Utc>) -> Claims {
        Claims {
            sub: UserId::new(),
            iat: iat.timestamp(),
            exp: exp.timestamp(),
        }
    }

    #[test]
    fn live_window_validates() {
        let now = Utc::now();
        let c = claims_at(now - Duration::minutes(1), now + Duration::days(7));
        assert_eq!(validate_claims(&c, now), Ok(()));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let c = claims_at(now - Duration::days(8), now - Duration::days(1));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_issued_at_is_rejected() {
        let now = Utc::now();
        let c = claims_at(now + Duration::minutes(5), now + Duration::days(7));
        assert_eq!(
            validate_claims(&c, now),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let c = claims_at(now, now - Duration::seconds(1));
        assert_eq!(
            validate_claims(&c, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
