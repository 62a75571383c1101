//! HTTP server.
//!
//! Provides endpoints for:
//! - Concurrent simulated tasks (`/async/tasks`)
//! - Concurrent URL fetches (`/async/http`)
//! - Sequential URL fetches (`/sync/http`)
//! - Health check (`/health`)

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod handlers;
pub mod responses;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Batch routes
        .route("/async/tasks", get(handlers::async_tasks))
        .route("/async/http", get(handlers::async_http))
        .route("/sync/http", get(handlers::sync_http))
        // Observability routes
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
