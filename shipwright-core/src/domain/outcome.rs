//! Terminal outcome of a job

use serde::{Deserialize, Serialize};

use super::deployment::DeploymentResult;
use super::job::JobRequest;

/// Terminal record of one job, delivered to the evaluation callback
///
/// Exactly one of `hosting_url` / `error_summary` is set, matching `succeeded`.
/// Construct through [`NotificationOutcome::success`] or
/// [`NotificationOutcome::failure`] to keep that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub task_id: String,
    pub round: u32,
    pub email: String,
    pub nonce: String,
    pub succeeded: bool,
    pub hosting_url: Option<String>,
    pub repository_url: Option<String>,
    pub commit_ref: Option<String>,
    pub error_summary: Option<String>,
    /// Generation attempts spent on this job
    pub attempts_made: u32,
}

impl NotificationOutcome {
    pub fn success(request: &JobRequest, deployment: &DeploymentResult, attempts_made: u32) -> Self {
        Self {
            task_id: request.task_id.clone(),
            round: request.round,
            email: request.email.clone(),
            nonce: request.nonce.clone(),
            succeeded: true,
            hosting_url: Some(deployment.hosting_url.clone()),
            repository_url: Some(deployment.repository_url.clone()),
            commit_ref: Some(deployment.commit_ref.clone()),
            error_summary: None,
            attempts_made,
        }
    }

    pub fn failure(
        request: &JobRequest,
        error_summary: impl Into<String>,
        attempts_made: u32,
    ) -> Self {
        Self {
            task_id: request.task_id.clone(),
            round: request.round,
            email: request.email.clone(),
            nonce: request.nonce.clone(),
            succeeded: false,
            hosting_url: None,
            repository_url: None,
            commit_ref: None,
            error_summary: Some(error_summary.into()),
            attempts_made,
        }
    }
}

/// Result of delivering an outcome to its callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub delivered: bool,
    pub attempts: u32,
}
