mod agent;
mod config;
mod error;
mod gateway;
mod routes;
mod state;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agent_chat_backend=debug,tower_http=debug")),
        )
        .init();

    // Local env files never override variables that are already set
    for env_file in [".env.local", ".env"] {
        if let Ok(path) = dotenvy::from_filename(env_file) {
            info!("Loaded environment from {}", path.display());
        }
    }

    let (config, source) = Config::discover()?;
    info!("Loaded configuration from: {}", source);
    config.log_warnings();

    let app_state = AppState::new(config.clone()).await?;

    // Build application
    let app = Router::new()
        .merge(routes::create_routes(&app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let system_config = &config.system_config;
    let listener = tokio::net::TcpListener::bind((system_config.host.as_str(), system_config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", system_config.host, system_config.port))?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
