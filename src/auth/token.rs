//! Signed session tokens (HS256 JWT).

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::ObjectId;

/// Claims embedded in every token. The Role Gate only reads `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_object_id(&self) -> Option<ObjectId> {
        self.user_id.parse().ok()
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

#[derive(Clone)]
pub struct TokenCodec {
    keys: Arc<Keys>,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: &ObjectId, role: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id: user_id.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
    }

    /// Verifies signature and expiry.
    ///
    /// Bad signatures, malformed input and expired tokens all yield `None`; the
    /// reason is only logged.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.keys.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::warn!(reason = ?e.kind(), "Token verification failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::from_secs(3600))
    }

    fn signed(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issued_tokens_verify() {
        let codec = codec();
        let user = ObjectId::new();
        let token = codec.issue(&user, "admin").unwrap();

        let claims = codec.verify(&token).expect("token should verify");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.user_object_id(), Some(user));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn huge_ttl_saturates_expiry() {
        for secs in [i64::MAX as u64, u64::MAX] {
            let codec = TokenCodec::new(SECRET, Duration::from_secs(secs));
            let token = codec.issue(&ObjectId::new(), "admin").unwrap();

            let claims = codec.verify(&token).expect("token should verify");
            assert_eq!(claims.exp, i64::MAX);
        }
    }

    #[test]
    fn wrong_secret_fails() {
        let other = TokenCodec::new("another_secret", Duration::from_secs(3600));
        let token = other.issue(&ObjectId::new(), "admin").unwrap();

        assert!(codec().verify(&token).is_none());
    }

    #[test]
    fn expired_token_fails() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: ObjectId::new().to_string(),
            role: "admin".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };

        assert!(codec().verify(&signed(&claims, SECRET)).is_none());
    }

    #[test]
    fn malformed_and_empty_tokens_fail() {
        let codec = codec();
        assert!(codec.verify("").is_none());
        assert!(codec.verify("not.a.jwt").is_none());
        assert!(codec.verify("invalid_token_here").is_none());
    }
}
