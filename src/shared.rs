use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::Authenticator;
use crate::hub::{ProjectSequencer, RoomHub};
use crate::task::repository::TaskRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<dyn RoomHub>,
    pub task_repository: Arc<dyn TaskRepository>,
    pub authenticator: Arc<dyn Authenticator>,
    pub sequencer: Arc<ProjectSequencer>,
}

impl AppState {
    pub fn new(
        hub: Arc<dyn RoomHub>,
        task_repository: Arc<dyn TaskRepository>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            hub,
            task_repository,
            authenticator,
            sequencer: Arc::new(ProjectSequencer::new()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
