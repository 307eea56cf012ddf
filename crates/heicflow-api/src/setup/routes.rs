//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Finalize events carry object resource JSON, never file contents.
const MAX_EVENT_BODY_BYTES: usize = 1024 * 1024;

/// Setup all application routes
///
/// Events are accepted at `/events/object-finalized` and at `/` (the path
/// push subscriptions and event triggers deliver to by default).
pub fn setup_routes(state: Arc<AppState>) -> Router<()> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/", post(handlers::events::object_finalized))
        .route(
            "/events/object-finalized",
            post(handlers::events::object_finalized),
        )
        .layer(RequestBodyLimitLayer::new(MAX_EVENT_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
