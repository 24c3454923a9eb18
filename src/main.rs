use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard_sync::{
    auth::{Authenticator, JwtAuthenticator, TokenConfig, TrustedAuthenticator},
    build_router,
    hub::InMemoryRoomHub,
    task::repository::{InMemoryTaskRepository, PostgresTaskRepository, TaskRepository},
    AppState, AuthMode, ServerConfig,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_sync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    info!(
        bind_addr = %config.bind_addr,
        auth_mode = %config.auth_mode,
        "Starting task board sync server"
    );

    let task_repository: Arc<dyn TaskRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            info!("Using PostgreSQL task repository");
            Arc::new(PostgresTaskRepository::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory task repository");
            Arc::new(InMemoryTaskRepository::new())
        }
    };

    let authenticator: Arc<dyn Authenticator> = match config.auth_mode {
        AuthMode::Jwt => Arc::new(JwtAuthenticator::new(TokenConfig::new(
            config.jwt_secret.clone(),
        ))),
        AuthMode::Trusted => Arc::new(TrustedAuthenticator),
    };

    let app_state = AppState::new(
        Arc::new(InMemoryRoomHub::new()),
        task_repository,
        authenticator,
    );

    let app = build_router(app_state, &config.cors_origin);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
