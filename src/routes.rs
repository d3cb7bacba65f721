use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers::{classify_handler, health_handler, metrics_handler};
use crate::state::AppState;

// creating the router with routes
pub fn create_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/classify", post(classify_handler))
        .route("/metrics", get(metrics_handler)) // metrics endpoint
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
