//! Router configuration for the web server.

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/scrape", post(handlers::scrape))
        .route("/scrape", post(handlers::scrape))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
