//! HTTP trigger service.
//!
//! `GET /api/scan` runs a scan and answers with its outcome; every other
//! path is served from the static root. All responses carry
//! `Access-Control-Allow-Origin: *`.

pub mod error;
mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::Result;
use state::AppState;

/// Build the axum Router (useful for testing).
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_root);

    Router::new()
        .route("/api/scan", get(routes::trigger_scan))
        .route("/api/scan/status", get(routes::scan_status))
        .fallback_service(static_files)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .with_state(state)
}

/// Start the trigger service and block until shutdown (Ctrl+C).
pub async fn start_server(listen_addr: SocketAddr, state: AppState) -> Result<()> {
    let static_root = state.static_root.display().to_string();
    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    tracing::info!(addr = %listen_addr, static_root = %static_root, "trigger service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("trigger service shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
