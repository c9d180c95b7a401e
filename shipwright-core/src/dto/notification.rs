//! Evaluation callback DTO

use serde::{Deserialize, Serialize};

use crate::domain::outcome::NotificationOutcome;

/// Body posted to the evaluation callback
///
/// `succeeded` is always present so the receiver can tell success from
/// failure without inspecting optional fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationNotice {
    pub email: String,
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
}

impl From<&NotificationOutcome> for EvaluationNotice {
    fn from(outcome: &NotificationOutcome) -> Self {
        Self {
            email: outcome.email.clone(),
            task: outcome.task_id.clone(),
            round: outcome.round,
            nonce: outcome.nonce.clone(),
            succeeded: outcome.succeeded,
            repo_url: outcome.repository_url.clone(),
            commit_sha: outcome.commit_ref.clone(),
            pages_url: outcome.hosting_url.clone(),
            error: outcome.error_summary.clone(),
            attempts: outcome.attempts_made,
        }
    }
}
