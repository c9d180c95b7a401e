//! Job orchestrator
//!
//! Drives one job through its states:
//!
//! ```text
//! RECEIVED -> GENERATING -> DEPLOYING -> NOTIFYING -> DONE
//!     |            |            |            ^
//!     +------------+------------+-> FAILED --+
//! ```
//!
//! The per-task lock is taken before generation and released once deployment
//! finishes. Generation and deployment share one deadline; notification runs
//! after it and is never bounded by it.

use shipwright_client::{
    CallbackClient, ClientError, CompletionClient, CompletionSettings, GitHubClient,
};
use shipwright_core::domain::deployment::DeploymentResult;
use shipwright_core::domain::job::{JobRequest, JobState};
use shipwright_core::domain::outcome::NotificationOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, debug, error, info, info_span};

use crate::config::RunnerConfig;
use crate::error::JobFailure;
use crate::repository::{
    CallbackRepository, CompletionRepository, HttpCallbackRepository, HttpCompletionRepository,
    HttpSourceControlRepository, SourceControlRepository,
};
use crate::scheduler::TaskLockRegistry;
use crate::service::{ArtifactGenerator, OutcomeNotifier, RepositoryDeployer, scaffold};

/// Runs jobs end to end; shared by every job the dispatcher spawns
pub struct JobOrchestrator {
    generator: ArtifactGenerator,
    deployer: RepositoryDeployer,
    notifier: OutcomeNotifier,
    locks: TaskLockRegistry,
    owner: String,
    job_timeout: Duration,
    lock_timeout: Duration,
}

impl JobOrchestrator {
    pub fn new(
        config: &RunnerConfig,
        completion: Arc<dyn CompletionRepository>,
        source_control: Arc<dyn SourceControlRepository>,
        callback: Arc<dyn CallbackRepository>,
    ) -> Self {
        let owner = source_control.owner().to_string();
        Self {
            generator: ArtifactGenerator::new(completion, config.generation_retry),
            deployer: RepositoryDeployer::new(
                source_control,
                config.source_control_retry,
                config.pages_poll_attempts,
                config.pages_poll_interval,
            ),
            notifier: OutcomeNotifier::new(callback, config.notification_retry),
            locks: TaskLockRegistry::new(),
            owner,
            job_timeout: config.job_timeout,
            lock_timeout: config.lock_timeout,
        }
    }

    /// Builds an orchestrator talking to the real upstream APIs
    pub fn from_config(config: &RunnerConfig) -> Result<Self, ClientError> {
        let completion = CompletionClient::new(
            &config.llm_base_url,
            &config.llm_api_key,
            CompletionSettings {
                model: config.llm_model.clone(),
                max_tokens: config.llm_max_tokens,
                temperature: config.llm_temperature,
                timeout: config.llm_timeout,
            },
        )?;
        let github = GitHubClient::new(
            &config.github_api_url,
            &config.github_token,
            &config.github_owner,
            config.http_timeout,
        )?;
        let callback = CallbackClient::new(config.http_timeout)?;

        Ok(Self::new(
            config,
            Arc::new(HttpCompletionRepository::new(completion)),
            Arc::new(HttpSourceControlRepository::new(github)),
            Arc::new(HttpCallbackRepository::new(callback)),
        ))
    }

    pub fn locks(&self) -> &TaskLockRegistry {
        &self.locks
    }

    /// Runs a job to completion and returns the outcome sent to its callback
    ///
    /// Never fails: every error becomes a failure outcome.
    pub async fn run(&self, request: JobRequest) -> NotificationOutcome {
        let span = info_span!(
            "job",
            task = %request.task_id,
            round = request.round,
            nonce = %request.nonce
        );
        self.execute(request).instrument(span).await
    }

    async fn execute(&self, request: JobRequest) -> NotificationOutcome {
        let mut state = StateTracker::new();
        info!(checks = request.checks.len(), attachments = request.attachments.len(), "Job received");

        let result = match self.locks.acquire(&request.task_id, self.lock_timeout).await {
            Ok(guard) => {
                let result = self.build_and_deploy(&request, &mut state).await;
                drop(guard);
                result
            }
            Err(err) => Err((JobFailure::from(err), 0)),
        };

        let outcome = match result {
            Ok((deployment, attempts)) => {
                state.advance(JobState::Notifying);
                info!(
                    url = %deployment.hosting_url,
                    commit = %deployment.commit_ref,
                    created = deployment.created,
                    "Deployment complete"
                );
                NotificationOutcome::success(&request, &deployment, attempts)
            }
            Err((failure, attempts)) => {
                state.advance(JobState::Failed);
                error!(attempts, "Job failed: {}", failure);
                state.advance(JobState::Notifying);
                NotificationOutcome::failure(&request, failure.to_string(), attempts)
            }
        };

        let delivery = self
            .notifier
            .notify(&outcome, &request.evaluation_callback)
            .await;
        state.advance(JobState::Done);

        info!(
            succeeded = outcome.succeeded,
            delivered = delivery.delivered,
            "Job finished"
        );
        outcome
    }

    /// Generation and deployment under the job deadline
    ///
    /// Both arms carry the generation attempts spent so far.
    async fn build_and_deploy(
        &self,
        request: &JobRequest,
        state: &mut StateTracker,
    ) -> Result<(DeploymentResult, u32), (JobFailure, u32)> {
        let deadline = Instant::now() + self.job_timeout;
        let exceeded = |stage| JobFailure::DeadlineExceeded {
            stage,
            limit: self.job_timeout,
        };

        state.advance(JobState::Generating);
        let generated = timeout_at(
            deadline,
            self.generator
                .generate(&request.brief, &request.checks, &request.attachments),
        )
        .await;

        let artifact = match generated {
            Ok(Ok(artifact)) => artifact,
            Ok(Err(err)) => {
                let attempts = err.attempts();
                return Err((err.into(), attempts));
            }
            Err(_) => return Err((exceeded(JobState::Generating), 0)),
        };

        let attempts = artifact.attempts;
        let artifact = scaffold::with_supporting_files(artifact, request, &self.owner);
        debug!(files = ?artifact.paths().collect::<Vec<_>>(), "Artifact ready");

        state.advance(JobState::Deploying);
        let deployed = timeout_at(
            deadline,
            self.deployer
                .deploy(&request.task_id, &artifact, request.round),
        )
        .await;

        match deployed {
            Ok(Ok(deployment)) => Ok((deployment, attempts)),
            Ok(Err(err)) => Err((err.into(), attempts)),
            Err(_) => Err((exceeded(JobState::Deploying), attempts)),
        }
    }
}

/// Current state of one job; every transition is logged
struct StateTracker {
    state: JobState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: JobState::Received,
        }
    }

    fn advance(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid job transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
    }
}
