//! HTTP API: Axum server exposing racecards, results, search, analysis
//! and the analytics brain behind the tier gate.
//!
//! CORS is open so browser front-ends on other origins can call it.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use routes::{AppState, CLIENT_KEY_HEADER};

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(CLIENT_KEY_HEADER)]);

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/racing/upcoming", get(routes::upcoming))
        .route("/api/racing/race/:race_id/standard", get(routes::race_detail))
        .route("/api/racing/results", get(routes::results))
        .route("/api/racing/search", get(routes::search))
        .route("/api/racing/analysis/:kind/:id", get(routes::analysis))
        .route("/api/brain/analyse", post(routes::brain))
        .fallback(routes::not_found)
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `0.0.0.0:port` until `shutdown` resolves.
pub async fn serve<F>(state: AppState, port: u16, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API port {port}"))?;
    info!(port, "API server listening on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    info!("API server stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
