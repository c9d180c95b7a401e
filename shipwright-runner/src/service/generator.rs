//! Artifact generation service
//!
//! Turns a brief, its checks and attachments into a validated file set:
//! - Builds the prompt
//! - Calls the completion repository under the generation retry policy
//! - Parses the reply and checks its structure
//!
//! A reply that fails validation is retried like a transient upstream error.

use shipwright_core::domain::artifact::GeneratedArtifact;
use shipwright_core::domain::job::Attachment;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{GenerationError, UpstreamError};
use crate::repository::CompletionRepository;
use crate::retry::{RetryFailure, RetryPolicy};

use super::artifact::{check_structure, parse_reply};
use super::prompt::{SYSTEM_PROMPT, build_prompt};

/// Why one generation attempt did not produce a usable artifact
#[derive(Debug)]
enum AttemptError {
    Upstream(UpstreamError),
    Invalid(String),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Upstream(err) => write!(f, "{}", err),
            AttemptError::Invalid(reason) => write!(f, "invalid output: {}", reason),
        }
    }
}

pub struct ArtifactGenerator {
    completion: Arc<dyn CompletionRepository>,
    retry: RetryPolicy,
}

impl ArtifactGenerator {
    pub fn new(completion: Arc<dyn CompletionRepository>, retry: RetryPolicy) -> Self {
        Self { completion, retry }
    }

    /// Generates a deployable artifact
    ///
    /// The returned artifact is always validated; its `attempts` is the
    /// number of completion calls it took.
    pub async fn generate(
        &self,
        brief: &str,
        checks: &[String],
        attachments: &[Attachment],
    ) -> Result<GeneratedArtifact, GenerationError> {
        let prompt = build_prompt(brief, checks, attachments);
        info!(
            model = self.completion.model(),
            prompt_len = prompt.len(),
            "Generating artifact"
        );

        let completion = &self.completion;
        let prompt = prompt.as_str();

        let result = self
            .retry
            .run(
                "generation",
                |attempt| async move {
                    debug!(attempt, "Requesting completion");
                    let reply = completion
                        .complete(SYSTEM_PROMPT, prompt)
                        .await
                        .map_err(AttemptError::Upstream)?;
                    let files = parse_reply(&reply).map_err(AttemptError::Invalid)?;
                    let missing = check_structure(&files, checks).map_err(AttemptError::Invalid)?;
                    Ok::<_, AttemptError>((files, missing))
                },
                |err| match err {
                    AttemptError::Upstream(upstream) => upstream.is_transient(),
                    AttemptError::Invalid(_) => true,
                },
            )
            .await;

        match result {
            Ok(((files, missing), attempts)) => {
                if !missing.is_empty() {
                    warn!(
                        markers = ?missing,
                        "Generated artifact does not define every element the checks reference"
                    );
                }
                info!(
                    attempts,
                    files = files.len(),
                    "Artifact generated and validated"
                );
                Ok(GeneratedArtifact::new(files, true, attempts))
            }
            Err(RetryFailure { attempts, error }) => Err(match error {
                AttemptError::Upstream(source) => GenerationError::Completion { attempts, source },
                AttemptError::Invalid(reason) => GenerationError::InvalidArtifact { attempts, reason },
            }),
        }
    }
}
