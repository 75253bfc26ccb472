//! Bearer-token issuance and validation (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiration (unix seconds).
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to issue token: {0}")]
    Issue(String),
}

/// Issues and validates bearer tokens for usernames.
pub trait TokenService: Send + Sync {
    fn issue(&self, username: &str) -> Result<String, TokenError>;

    /// Resolve a token back to its subject, rejecting expired or garbled
    /// tokens.
    fn verify(&self, token: &str) -> Result<String, TokenError>;
}

/// HS256-signed JWTs with a fixed time-to-live.
pub struct Hs256TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

impl TokenService for Hs256TokenService {
    fn issue(&self, username: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<String, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips() {
        let service = Hs256TokenService::new(b"test-secret", Duration::minutes(10));
        let token = service.issue("olena").unwrap();
        assert_eq!(service.verify(&token).unwrap(), "olena");
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = Hs256TokenService::new(b"test-secret", Duration::seconds(-120));
        let token = service.issue("olena").unwrap();
        assert_eq!(service.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let service = Hs256TokenService::new(b"test-secret", Duration::minutes(10));
        let other = Hs256TokenService::new(b"other-secret", Duration::minutes(10));
        let token = other.issue("olena").unwrap();
        assert!(matches!(service.verify(&token), Err(TokenError::Invalid(_))));
    }
}
