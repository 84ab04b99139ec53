pub mod password;
pub mod session;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::session::Id;
use uuid::Uuid;

pub use password::{PasswordError, PasswordHasher};
pub use session::{MemorySessionStore, SESSION_COOKIE, USER_ID_KEY};

/// Longest session lifetime the signer accepts, in hours
pub const MAX_SESSION_HOURS: u64 = 24 * 365;

/// Claims carried by the bearer token handed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// Server-side session id
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, session_id: Id, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            sid: session_id.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
        }
    }

    /// `None` when the id is not one the session store could have issued
    pub fn session_id(&self) -> Option<Id> {
        self.sid.parse().ok()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Session secret is not configured")]
    InvalidSecret,

    #[error("Session lifetime must be between 1 and {MAX_SESSION_HOURS} hours")]
    InvalidLifetime,

    #[error("Token generation error: {0}")]
    Generation(String),

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// Signs and verifies session tokens (HS256)
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_hours: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        if ttl_hours == 0 || ttl_hours > MAX_SESSION_HOURS {
            return Err(TokenError::InvalidLifetime);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours as i64),
        })
    }

    /// Lifetime given to new sessions
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Check signature and expiry. Whether the session still exists is the
    /// caller's concern.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        self.decode(token, &validation)
    }

    /// Signature check only, for tearing down sessions whose token has
    /// already expired
    pub fn verify_ignoring_expiry(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.remove("exp");
        self.decode(token, &validation)
    }

    fn decode(&self, token: &str, validation: &Validation) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(lifetime: Duration) -> Claims {
        let now = Utc::now();
        Claims::new(Uuid::new_v4(), Id::default(), now, now + lifetime)
    }

    #[test]
    fn round_trips_claims() {
        let signer = TokenSigner::new("secret", 1).unwrap();
        let issued = claims(signer.ttl());
        let token = signer.sign(&issued).unwrap();

        let verified = signer.verify(&token).unwrap();
        assert_eq!(verified, issued);
        assert!(verified.session_id().is_some());
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let signer = TokenSigner::new("secret", 1).unwrap();
        let other = TokenSigner::new("other", 1).unwrap();
        let token = other.sign(&claims(Duration::hours(1))).unwrap();

        assert!(matches!(signer.verify(&token), Err(TokenError::Invalid(_))));
        assert!(signer.verify_ignoring_expiry(&token).is_err());
    }

    #[test]
    fn expired_token_still_names_its_session() {
        let signer = TokenSigner::new("secret", 1).unwrap();
        let issued = claims(Duration::hours(-1));
        let token = signer.sign(&issued).unwrap();

        assert!(signer.verify(&token).is_err());
        assert_eq!(signer.verify_ignoring_expiry(&token).unwrap().sid, issued.sid);
    }

    #[test]
    fn requires_secret() {
        assert!(matches!(TokenSigner::new("", 1), Err(TokenError::InvalidSecret)));
    }

    #[test]
    fn bounds_session_lifetime() {
        assert!(matches!(TokenSigner::new("secret", 0), Err(TokenError::InvalidLifetime)));
        assert!(matches!(
            TokenSigner::new("secret", u64::MAX),
            Err(TokenError::InvalidLifetime)
        ));
        assert!(TokenSigner::new("secret", MAX_SESSION_HOURS).is_ok());
    }
}
