use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::{debug, instrument};

use super::types::UserClaims;
use crate::shared::AppError;

/// Verifies tokens minted by the auth service with a shared HS256 secret
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Mints a token as the auth service would
    #[cfg(test)]
    pub fn create_token(&self, user_id: &str, expiration_days: i64) -> Result<String, AppError> {
        use chrono::{Duration, Utc};
        use jsonwebtoken::{encode, EncodingKey, Header};

        let now = Utc::now();
        let claims = UserClaims {
            sub: user_id.to_string(),
            exp: (now + Duration::days(expiration_days)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| AppError::JwtError(e.to_string()))
    }

    /// Validates a JWT token and returns the claims if valid
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<UserClaims, AppError> {
        debug!("Decoding and validating JWT token");

        decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| {
            debug!(
                user_id = %data.claims.sub,
                exp = data.claims.exp,
                "JWT token decoded successfully"
            );
            data.claims
        })
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            AppError::JwtError(e.to_string())
        })
    }
}
