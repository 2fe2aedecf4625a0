//! REST API and WebSocket server for the sensor hub
//!
//! This module provides HTTP endpoints for ingesting and querying readings,
//! plus WebSocket support for real-time reading streaming.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **ReadingService** for ingest and query
//! - **BroadcasterHandle** for live subscriptions
//!
//! ## Endpoints
//!
//! - `POST /data` - Ingest one sensor payload
//! - `GET /data/latest?count=N` - Most recent readings, newest first
//! - `GET /ws` - Real-time reading streaming
//! - `GET /health` - Health check
//! - `GET /stats` - Store and broadcaster statistics

pub mod error;
pub mod routes;
pub mod state;
pub mod types;
pub mod websocket;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{HealthResponse, IngestResponse, LatestQuery, LatestResponse, StatsResponse};

use std::net::{Ipv4Addr, SocketAddr};

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Enable CORS for browser dashboards
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            enable_cors: true,
        }
    }
}

/// Build the router with all routes
pub fn router(state: ApiState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .route("/data", post(routes::readings::ingest))
        .route("/data/latest", get(routes::readings::latest))
        .route("/ws", get(websocket::websocket_handler))
        .route("/health", get(routes::health::health_check))
        .route("/stats", get(routes::stats::get_stats))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, config.enable_cors);

    // Bind and serve
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
