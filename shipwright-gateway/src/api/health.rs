//! Health Check API Handler

use axum::{Json, extract::State};
use shipwright_core::dto::task::HealthReport;

use super::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy".to_string(),
        service: "shipwright".to_string(),
        active_jobs: state.dispatcher.active_jobs(),
    })
}
