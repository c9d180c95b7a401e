//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One automation task: build (round 1) or revise (round > 1) a deployed app.
///
/// Owned by the orchestrator for the lifetime of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Requester identity, echoed back in the evaluation callback
    pub email: String,
    /// Stable identifier of the target deployment; all rounds share one repository
    pub task_id: String,
    pub round: u32,
    /// De-duplication token for re-delivered requests
    pub nonce: String,
    pub brief: String,
    /// Ordered acceptance criteria the generated app must satisfy
    pub checks: Vec<String>,
    pub evaluation_callback: String,
    pub attachments: Vec<Attachment>,
}

impl JobRequest {
    /// Key used to recognise a re-delivery of the same request
    pub fn delivery_key(&self) -> DeliveryKey {
        DeliveryKey {
            task_id: self.task_id.clone(),
            round: self.round,
            nonce: self.nonce.clone(),
        }
    }

    /// Checks field-level invariants, returning every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.task_id.trim().is_empty() {
            problems.push("task must not be empty".to_string());
        }
        if self.round == 0 {
            problems.push("round must be >= 1".to_string());
        }
        if self.nonce.trim().is_empty() {
            problems.push("nonce must not be empty".to_string());
        }
        if self.brief.trim().is_empty() {
            problems.push("brief must not be empty".to_string());
        }
        if !self.evaluation_callback.starts_with("http://")
            && !self.evaluation_callback.starts_with("https://")
        {
            problems.push(format!(
                "evaluation_url must start with http:// or https:// (got '{}')",
                self.evaluation_callback
            ));
        }
        for (idx, attachment) in self.attachments.iter().enumerate() {
            if attachment.name.trim().is_empty() {
                problems.push(format!("attachment {} has no name", idx + 1));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// A named attachment; `content` is usually a `data:` URI, sometimes a plain URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Identity of one delivery of a request: `(task, round, nonce)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryKey {
    pub task_id: String,
    pub round: u32,
    pub nonce: String,
}

impl fmt::Display for DeliveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} ({})", self.task_id, self.round, self.nonce)
    }
}

/// Pipeline states of a single job
///
/// `Failed` can be entered from `Received`, `Generating` or `Deploying`; both
/// paths end in `Notifying` and then `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Received,
    Generating,
    Deploying,
    Failed,
    Notifying,
    Done,
}

impl JobState {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Received, Generating)
                | (Received, Failed)
                | (Generating, Deploying)
                | (Generating, Failed)
                | (Deploying, Notifying)
                | (Deploying, Failed)
                | (Failed, Notifying)
                | (Notifying, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == JobState::Done
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Received => "RECEIVED",
            JobState::Generating => "GENERATING",
            JobState::Deploying => "DEPLOYING",
            JobState::Failed => "FAILED",
            JobState::Notifying => "NOTIFYING",
            JobState::Done => "DONE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobRequest {
        JobRequest {
            email: "student@example.com".to_string(),
            task_id: "captcha-solver".to_string(),
            round: 1,
            nonce: "ab12".to_string(),
            brief: "Build a captcha solver".to_string(),
            checks: vec!["Page has a title".to_string()],
            evaluation_callback: "https://eval.example.com/notify".to_string(),
            attachments: vec![],
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_problems() {
        let mut req = request();
        req.task_id = "  ".to_string();
        req.round = 0;
        req.evaluation_callback = "ftp://nope".to_string();

        let problems = req.validate().unwrap_err();
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.contains("round")));
    }

    #[test]
    fn test_delivery_key_ignores_payload() {
        let a = request();
        let mut b = request();
        b.brief = "Something else".to_string();
        assert_eq!(a.delivery_key(), b.delivery_key());

        b.nonce = "cd34".to_string();
        assert_ne!(a.delivery_key(), b.delivery_key());
    }

    #[test]
    fn test_state_machine_transitions() {
        assert!(JobState::Received.can_transition_to(JobState::Generating));
        assert!(JobState::Received.can_transition_to(JobState::Failed));
        assert!(JobState::Deploying.can_transition_to(JobState::Failed));
        assert!(JobState::Failed.can_transition_to(JobState::Notifying));
        assert!(!JobState::Generating.can_transition_to(JobState::Notifying));
        assert!(!JobState::Notifying.can_transition_to(JobState::Failed));
        assert!(!JobState::Done.can_transition_to(JobState::Received));
        assert!(JobState::Done.is_terminal());
    }
}
