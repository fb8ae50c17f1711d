//! Router configuration for the Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{connector_get, connector_post, AppState};

/// Slack on top of the configured upload limit for multipart framing
/// and the accompanying form fields.
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

/// Create the connector router.
pub fn create_router(app_state: Arc<AppState>, max_upload_size: usize) -> Router {
    Router::new()
        .route("/connector", get(connector_get).post(connector_post))
        .layer(DefaultBodyLimit::max(max_upload_size + BODY_LIMIT_OVERHEAD))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
