//! Signed session tokens.
//!
//! HS256 encoding/decoding of [`SessionClaims`] lives here at the transport
//! boundary; the time-window and email rules are validated separately by the
//! pure checks in `coursehub-auth`.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use coursehub_auth::SessionClaims;
use coursehub_core::{DomainError, DomainResult};

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    /// Verified email.
    sub: String,
    iat: i64,
    exp: i64,
}

/// HS256 codec for session tokens.
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn encode(&self, claims: &SessionClaims) -> DomainResult<String> {
        let token = TokenClaims {
            sub: claims.email.clone(),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &token, &self.encoding)
            .map_err(|e| DomainError::internal(format!("token encode: {e}")))
    }

    /// Verify the signature and lift the raw claims. Expiry is checked by the
    /// deterministic claims validation downstream, not here.
    pub fn decode(&self, token: &str) -> DomainResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|_| DomainError::Unauthenticated)?;

        Ok(SessionClaims {
            email: data.claims.sub,
            issued_at: timestamp(data.claims.iat)?,
            expires_at: timestamp(data.claims.exp)?,
        })
    }
}

fn timestamp(secs: i64) -> DomainResult<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(DomainError::Unauthenticated)
}
