//! Task submission handler
//!
//! Authenticates a submission, validates it, and hands it to the dispatcher.
//! The response only says whether the job was admitted; its result reaches
//! the evaluation callback later.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use shipwright_core::dto::task::{SubmissionAck, TaskSubmission};
use shipwright_runner::Admission;

use super::AppState;
use crate::api::error::{ApiError, ApiResult};

const ACCEPTED_STATUS: &str = "Request received and is being processed.";
const DUPLICATE_STATUS: &str = "duplicate";

/// POST /api-endpoint
pub async fn submit_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskSubmission>, JsonRejection>,
) -> ApiResult<Json<SubmissionAck>> {
    let Json(submission) = payload.map_err(|rejection| {
        tracing::debug!("Rejected submission body: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;

    let (secret, request) = submission.into_parts();

    if secret != state.shared_secret.as_ref() {
        tracing::warn!(task = %request.task_id, "Submission with invalid secret");
        return Err(ApiError::Unauthorized);
    }

    request
        .validate()
        .map_err(|problems| ApiError::BadRequest(problems.join("; ")))?;

    let task = request.task_id.clone();
    let round = request.round;
    tracing::info!(task = %task, round, nonce = %request.nonce, "Task submission received");

    let status = match state.dispatcher.submit(request)? {
        Admission::Accepted => ACCEPTED_STATUS,
        Admission::Duplicate => DUPLICATE_STATUS,
    };

    Ok(Json(SubmissionAck {
        status: status.to_string(),
        task,
        round,
    }))
}
