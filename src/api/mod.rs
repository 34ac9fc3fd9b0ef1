//! HTTP trigger surface for the monitoring hub
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - Shared [`ApiState`] carrying the store, batch runner and alert
//!   dispatcher
//! - Permissive CORS so the dashboard (and cron webhooks) can call
//!   from anywhere
//!
//! ## Endpoints
//!
//! - `GET  /api/v1/health` - Store health probe
//! - `POST /api/v1/jobs/monitor` - Run one monitoring pass
//! - `POST /api/v1/alerts/send` - Dispatch one alert (or a test alert)

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,
}

/// Build the router. Split out from [`spawn_api_server`] so tests can
/// drive it without binding a socket.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/jobs/monitor", post(routes::jobs::run_monitor))
        .route("/api/v1/alerts/send", post(routes::alerts::send_alert))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Spawn the API server in a background task and return its local
/// address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
