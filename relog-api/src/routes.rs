//! API route configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))

        // Writes
        .route("/add_resource", post(handlers::add_resource))
        .route("/cleanup", post(handlers::cleanup))

        // Lookups
        .route("/get_resources/:user_id", get(handlers::get_resources))
        .route("/get_by_timestamp/:timestamp", get(handlers::get_by_timestamp))
        .route("/get_all_by_timestamp/:timestamp", get(handlers::get_by_timestamp))
        .route("/resources", get(handlers::list_resources))
        .route("/stats", get(handlers::get_stats))

        .with_state(state)
}
