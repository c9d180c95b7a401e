//! Pipeline error taxonomy
//!
//! `UpstreamError` is what the repository layer reports for a single call.
//! The stage errors wrap it once a stage's retry budget is spent; `JobFailure`
//! is what the orchestrator turns into a failure outcome.

use shipwright_client::ClientError;
use shipwright_core::domain::job::JobState;
use std::time::Duration;
use thiserror::Error;

/// Failure of one upstream call, classified for branching and retry decisions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Rate limits, 5xx, timeouts, connection failures
    #[error("transient failure: {0}")]
    Transient(String),

    /// Anything retrying will not fix (bad credentials, invalid input, ...)
    #[error("rejected: {0}")]
    Rejected(String),
}

impl UpstreamError {
    pub fn is_transient(&self) -> bool {
        matches!(self, UpstreamError::Transient(_))
    }
}

impl From<ClientError> for UpstreamError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        if err.is_not_found() {
            UpstreamError::NotFound(message)
        } else if err.is_conflict() {
            UpstreamError::AlreadyExists(message)
        } else if err.is_transient() {
            UpstreamError::Transient(message)
        } else {
            UpstreamError::Rejected(message)
        }
    }
}

/// The completion call or its output failed after the retry budget
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("completion request failed after {attempts} attempt(s): {source}")]
    Completion {
        attempts: u32,
        #[source]
        source: UpstreamError,
    },

    #[error("generated output failed validation after {attempts} attempt(s): {reason}")]
    InvalidArtifact { attempts: u32, reason: String },
}

impl GenerationError {
    pub fn attempts(&self) -> u32 {
        match self {
            GenerationError::Completion { attempts, .. }
            | GenerationError::InvalidArtifact { attempts, .. } => *attempts,
        }
    }
}

/// A source-control operation failed after the retry budget, or a revision
/// targeted a repository that does not exist
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeploymentError {
    #[error("repository '{repository}' does not exist, round {round} cannot revise it")]
    MissingRepository { repository: String, round: u32 },

    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    SourceControl {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: UpstreamError,
    },
}

/// The callback stayed unreachable for the whole backoff schedule
///
/// Terminal for the notification only; the job outcome is unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("callback {url} not reached after {attempts} attempt(s): {reason}")]
pub struct NotificationDeliveryError {
    pub url: String,
    pub attempts: u32,
    pub reason: String,
}

/// The per-task execution slot could not be acquired in time
#[derive(Debug, Clone, PartialEq, Error)]
#[error("task '{task_id}' is busy with another round; gave up after {waited:?}")]
pub struct AdmissionTimeoutError {
    pub task_id: String,
    pub waited: Duration,
}

/// Why a job ended without a deployment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobFailure {
    #[error("admission failed: {0}")]
    Admission(#[from] AdmissionTimeoutError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("deployment failed: {0}")]
    Deployment(#[from] DeploymentError),

    #[error("job deadline of {limit:?} exceeded while {stage}")]
    DeadlineExceeded { stage: JobState, limit: Duration },
}
