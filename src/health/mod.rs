//! Liveness server: Axum responder for external uptime monitors.
//!
//! Shares no state with the scan loop; it only proves the process is up.

use anyhow::{Context, Result};
use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Body returned on `/` for uptime monitors.
pub const RUNNING_BODY: &str = "Bot is running!";

/// Bind the liveness port and serve it from a background task.
///
/// Binding happens before this returns, so a taken port fails startup.
pub async fn spawn_health_server(port: u16) -> Result<JoinHandle<()>> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind liveness port {port}"))?;

    info!(port, "Liveness server listening on http://0.0.0.0:{port}");

    let app = build_router();
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Liveness server error");
        }
    }))
}

/// Build the Axum router.
pub fn build_router() -> Router {
    Router::new()
        .route("/", get(running))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

/// GET /
async fn running() -> &'static str {
    RUNNING_BODY
}

/// GET /health
async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
