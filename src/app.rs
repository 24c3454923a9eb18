use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::jwt_auth;
use crate::shared::AppState;
use crate::task;
use crate::websockets::websocket_handler;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "service": "taskboard-sync",
    }))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            warn!(origin = %origin, error = %e, "Invalid CORS origin, allowing any");
            layer.allow_origin(Any)
        }
    }
}

/// Full HTTP surface: health, the WebSocket endpoint and the task API
pub fn build_router(app_state: AppState, cors_origin: &str) -> Router {
    let api = Router::new()
        .route("/tasks", get(task::list_tasks))
        .route("/tasks/:id/move", put(task::move_task))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), jwt_auth));

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket_handler))
        .nest("/api", api)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
