//! Task submission DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::{Attachment, JobRequest};

/// Inbound task submission as posted to the gateway
///
/// Field names follow the evaluation service's wire format; the camelCase
/// names are accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSubmission {
    pub email: String,
    pub secret: String,
    #[serde(alias = "taskId")]
    pub task: String,
    pub round: u32,
    pub nonce: String,
    pub brief: String,
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(alias = "evaluationCallback")]
    pub evaluation_url: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
}

/// Attachment on the wire; `url` is usually a `data:` URI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentPayload {
    pub name: String,
    #[serde(default, alias = "content")]
    pub url: Option<String>,
}

impl TaskSubmission {
    /// Splits the submission into its secret and the job it describes
    ///
    /// The secret never travels past the gateway.
    pub fn into_parts(self) -> (String, JobRequest) {
        let request = JobRequest {
            email: self.email,
            task_id: self.task,
            round: self.round,
            nonce: self.nonce,
            brief: self.brief,
            checks: self.checks,
            evaluation_callback: self.evaluation_url,
            attachments: self
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    name: a.name,
                    content: a.url,
                })
                .collect(),
        };
        (self.secret, request)
    }
}

/// Gateway answer to an accepted (or de-duplicated) submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAck {
    pub status: String,
    pub task: String,
    pub round: u32,
}

/// Gateway health report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub active_jobs: usize,
}
