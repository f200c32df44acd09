use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session token claims (transport-agnostic).
///
/// The identity provider has already verified the email by the time a token is
/// minted; this is the minimal set of claims the core expects once the token
/// has been decoded by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Verified email of the signed-in user.
    pub email: String,

    /// Issued-at timestamp. Also the watermark for the idempotent
    /// `last_login_at` update: the resolver bumps `last_login_at` at most once
    /// per issued token.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token carries no usable email")]
    MissingEmail,
}

/// Deterministically validate session claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding is
/// intentionally outside this crate.
pub fn validate_claims(
    claims: &SessionClaims,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    if claims.email.trim().is_empty() || !claims.email.contains('@') {
        return Err(TokenValidationError::MissingEmail);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued_offset_min: i64, expires_offset_min: i64) -> (SessionClaims, DateTime<Utc>) {
        let now = Utc::now();
        (
            SessionClaims {
                email: "advocate@example.com".to_string(),
                issued_at: now + Duration::minutes(issued_offset_min),
                expires_at: now + Duration::minutes(expires_offset_min),
            },
            now,
        )
    }

    #[test]
    fn accepts_valid_window() {
        let (c, now) = claims(-5, 55);
        assert!(validate_claims(&c, now).is_ok());
    }

    #[test]
    fn rejects_expired() {
        let (c, now) = claims(-120, -60);
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn rejects_future_issue() {
        let (c, now) = claims(10, 70);
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn rejects_inverted_window() {
        let (c, now) = claims(0, -10);
        assert_eq!(
            validate_claims(&c, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn rejects_missing_email() {
        let (mut c, now) = claims(-5, 55);
        c.email = "  ".to_string();
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::MissingEmail));
    }
}
