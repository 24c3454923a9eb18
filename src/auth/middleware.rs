use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::types::AuthenticatedUser;
use crate::shared::{AppError, AppState};

/// Bearer-token middleware - verifies the Authorization header with the
/// configured authenticator and adds AuthenticatedUser to the request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), auth::jwt_auth))
#[instrument(skip(state, req, next), fields(uri = %req.uri()))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let user_id = match state.authenticator.verify(token).await {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!("Authentication failed: {}", e);
            return Err(e);
        }
    };

    debug!(user_id = %user_id, "Authentication successful");

    req.extensions_mut().insert(AuthenticatedUser(user_id));

    Ok(next.run(req).await)
}
