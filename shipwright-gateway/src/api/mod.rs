//! API Module
//!
//! HTTP front door of the pipeline.

pub mod error;
pub mod health;
pub mod task;

use axum::{
    Router,
    routing::{get, post},
};
use shipwright_runner::JobDispatcher;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<JobDispatcher>,
    pub shared_secret: Arc<str>,
}

impl AppState {
    pub fn new(dispatcher: Arc<JobDispatcher>, shared_secret: impl Into<Arc<str>>) -> Self {
        Self {
            dispatcher,
            shared_secret: shared_secret.into(),
        }
    }
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api-endpoint", post(task::submit_task))
        .route("/task", post(task::submit_task))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
