//! HTTP API module
//! 
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tasks", get(tasks_handler))
        .route("/tasks/reset-all", post(reset_all_handler))
        .route("/tasks/:id/start", post(start_handler))
        .route("/tasks/:id/pause", post(pause_handler))
        .route("/tasks/:id/reset", post(reset_handler))
        .route("/tasks/:id/toggle", post(toggle_handler))
        .route("/tasks/:id/stop-alarm", post(stop_alarm_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
