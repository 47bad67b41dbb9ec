//! HS256 bearer tokens.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{ApiError, ApiResult};

/// Claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_hours: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs: (ttl_hours as i64).saturating_mul(3600),
        }
    }

    /// Use the configured secret, or a random one that lives as long as the process.
    pub fn from_config(config: &AuthConfig) -> Self {
        match config.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret.as_bytes(), config.token_ttl_hours),
            None => {
                tracing::warn!(
                    "No JWT secret configured; using a random secret, tokens will not survive a restart"
                );
                let secret: [u8; 32] = rand::random();
                Self::new(STANDARD.encode(secret).as_bytes(), config.token_ttl_hours)
            }
        }
    }

    fn sign(&self, claims: &Claims) -> ApiResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(ApiError::internal)
    }

    /// Issue a token for a user, valid from now for the configured lifetime.
    pub fn issue(&self, user_id: i64, email: &str) -> ApiResult<String> {
        let now = chrono::Utc::now().timestamp();
        self.sign(&Claims {
            id: user_id,
            email: email.to_lowercase(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        })
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected token");
                ApiError::invalid_token()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn issued_token_verifies() {
        let issuer = TokenIssuer::new(b"secret", 24);
        let token = issuer.issue(7, "Ada@Example.com").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = TokenIssuer::new(b"one", 24).issue(1, "a@b.c").unwrap();
        let err = TokenIssuer::new(b"two", 24).verify(&token).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidToken);
    }

    #[test]
    fn expired_token_is_invalid() {
        let issuer = TokenIssuer::new(b"secret", 24);
        let now = chrono::Utc::now().timestamp();
        let token = issuer
            .sign(&Claims {
                id: 1,
                email: "a@b.c".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert_eq!(
            issuer.verify(&token).unwrap_err().code,
            ErrorCode::InvalidToken
        );
    }

    #[test]
    fn garbage_is_invalid() {
        let issuer = TokenIssuer::new(b"secret", 24);
        assert!(issuer.verify("not.a.token").is_err());
    }
}
