//! Route definitions for the API server

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // The chart front end is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/filters", get(handlers::get_filters))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/export/:table", get(handlers::export_csv))
        .route("/dataset/reload", post(handlers::reload_dataset))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
