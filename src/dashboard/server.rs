use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::routes;
use super::state::DashboardState;

/// Build the dashboard router around `state`.
pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        // HTML pages
        .route("/", get(routes::index))
        .route("/chat/generate", post(routes::generate))
        .route("/chat/reset", post(routes::reset))
        .route("/museums", get(routes::museums))
        // JSON API endpoints
        .route("/api/conversation", get(routes::get_conversation))
        .route("/api/stats", get(routes::get_stats))
        .route("/api/museums", get(routes::get_museums))
        .route("/api/weather", get(routes::get_weather))
        .with_state(state)
}

/// Start the Axum web dashboard server on the given port.
///
/// This runs as a background tokio task alongside the REPL.
pub async fn start_dashboard(state: Arc<DashboardState>, port: u16) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind dashboard to {addr}"))?;

    axum::serve(listener, router(state)).await?;
    Ok(())
}
