//! Bearer tokens for the repository

use jsonwebtoken::{encode, EncodingKey, Header};
use quarry_core::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifetime of each issued token
const TOKEN_LIFETIME_SECS: u64 = 3600;

/// JWT claims presented to the repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
    pub role: String,
}

/// Signs short-lived HS256 tokens with the shared secret
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
    subject: String,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            subject: "quarry".to_string(),
        }
    }

    pub fn claims(&self) -> Claims {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Claims {
            sub: self.subject.clone(),
            iss: "quarry".to_string(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
            role: "fedoraAdmin".to_string(),
        }
    }

    /// Issue a token for a request to `uri`
    pub fn token(&self, uri: &str) -> Result<String, FetchError> {
        encode(&Header::default(), &self.claims(), &self.key)
            .map_err(|e| FetchError::auth(uri, format!("unable to sign token: {e}")))
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn test_token_round_trips_with_secret() {
        let signer = TokenSigner::new("s3cret");
        let token = signer.token("http://repo/x").unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"s3cret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "quarry");
        assert!(data.claims.exp > data.claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenSigner::new("s3cret").token("http://repo/x").unwrap();
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }
}
