use async_trait::async_trait;
use tracing::{debug, warn};

use super::token::TokenConfig;
use crate::shared::AppError;

/// Turns a client-presented credential into a verified user id.
/// The hub trusts whatever identity this returns.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<String, AppError>;
}

/// Verifies HS256 JWTs and returns their `sub` claim
pub struct JwtAuthenticator {
    token_config: TokenConfig,
}

impl JwtAuthenticator {
    pub fn new(token_config: TokenConfig) -> Self {
        Self { token_config }
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn verify(&self, credential: &str) -> Result<String, AppError> {
        let claims = self.token_config.validate_token(credential)?;
        if claims.sub.is_empty() {
            warn!("JWT has an empty subject");
            return Err(AppError::Unauthorized("Token has no subject".to_string()));
        }
        Ok(claims.sub)
    }
}

/// Treats the credential itself as the user id. For development and tests,
/// where the client simply announces who it is.
pub struct TrustedAuthenticator;

#[async_trait]
impl Authenticator for TrustedAuthenticator {
    async fn verify(&self, credential: &str) -> Result<String, AppError> {
        let user_id = credential.trim();
        if user_id.is_empty() {
            return Err(AppError::Unauthorized("Missing user id".to_string()));
        }
        debug!(user_id = %user_id, "Trusting client-supplied user id");
        Ok(user_id.to_string())
    }
}
