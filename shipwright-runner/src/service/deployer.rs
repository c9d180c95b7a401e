//! Repository deployment service
//!
//! Publishes a validated artifact to the task's repository:
//! - Round 1 creates the repository, falling back to update when it exists
//! - Later rounds update an existing repository and fail if there is none
//! - All files land in a single commit
//! - Public hosting is enabled and polled until ready, best effort
//!
//! Every source-control call runs under the source-control retry policy.

use shipwright_core::domain::artifact::GeneratedArtifact;
use shipwright_core::domain::deployment::{
    DeploymentResult, RepositoryInfo, default_hosting_url, repository_name,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DeploymentError, UpstreamError};
use crate::repository::SourceControlRepository;
use crate::retry::{RetryFailure, RetryPolicy};

pub struct RepositoryDeployer {
    source_control: Arc<dyn SourceControlRepository>,
    retry: RetryPolicy,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl RepositoryDeployer {
    pub fn new(
        source_control: Arc<dyn SourceControlRepository>,
        retry: RetryPolicy,
        poll_attempts: u32,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source_control,
            retry,
            poll_attempts,
            poll_interval,
        }
    }

    /// Deploys `artifact` as round `round` of `task_id`
    pub async fn deploy(
        &self,
        task_id: &str,
        artifact: &GeneratedArtifact,
        round: u32,
    ) -> Result<DeploymentResult, DeploymentError> {
        let name = repository_name(task_id);

        let (repo, created) = if round <= 1 {
            match self.create(&name, task_id).await? {
                Some(repo) => (repo, true),
                None => {
                    info!(repository = %name, "Repository already exists, updating it instead");
                    (self.locate(&name, round).await?, false)
                }
            }
        } else {
            (self.locate(&name, round).await?, false)
        };

        let message = if created {
            format!(
                "Initial deployment: auto-generated web application ({} files)",
                artifact.files.len()
            )
        } else {
            format!(
                "Round {} update: revised application ({} files)",
                round,
                artifact.files.len()
            )
        };

        let commit_ref = self.commit(&repo, artifact, &message).await?;
        info!(repository = %repo.name, commit = %commit_ref, created, "Files committed");

        let hosting_url = self.ensure_hosting(&repo).await;

        Ok(DeploymentResult {
            repository_name: repo.name,
            repository_url: repo.html_url,
            created,
            hosting_url,
            commit_ref,
        })
    }

    /// Creates the repository; `None` if it already exists
    async fn create(
        &self,
        name: &str,
        task_id: &str,
    ) -> Result<Option<RepositoryInfo>, DeploymentError> {
        let description = format!("Auto-generated web application for task {}", task_id);
        let source_control = &self.source_control;
        let description = description.as_str();

        let result = self
            .retry
            .run(
                "repository creation",
                |_| async move { source_control.create_repository(name, description).await },
                UpstreamError::is_transient,
            )
            .await;

        match result {
            Ok((repo, _)) => {
                info!(repository = %repo.name, url = %repo.html_url, "Repository created");
                Ok(Some(repo))
            }
            Err(RetryFailure {
                error: UpstreamError::AlreadyExists(_),
                ..
            }) => Ok(None),
            Err(failure) => Err(source_control_error("repository creation", failure)),
        }
    }

    /// Looks up an existing repository for an update
    async fn locate(&self, name: &str, round: u32) -> Result<RepositoryInfo, DeploymentError> {
        let source_control = &self.source_control;

        let result = self
            .retry
            .run(
                "repository lookup",
                |_| async move { source_control.get_repository(name).await },
                UpstreamError::is_transient,
            )
            .await;

        match result {
            Ok((repo, _)) => Ok(repo),
            Err(RetryFailure {
                error: UpstreamError::NotFound(_),
                ..
            }) => Err(DeploymentError::MissingRepository {
                repository: name.to_string(),
                round,
            }),
            Err(failure) => Err(source_control_error("repository lookup", failure)),
        }
    }

    async fn commit(
        &self,
        repo: &RepositoryInfo,
        artifact: &GeneratedArtifact,
        message: &str,
    ) -> Result<String, DeploymentError> {
        let source_control = &self.source_control;
        let files = &artifact.files;

        self.retry
            .run(
                "commit",
                |_| async move { source_control.commit_files(repo, files, message).await },
                UpstreamError::is_transient,
            )
            .await
            .map(|(sha, _)| sha)
            .map_err(|failure| source_control_error("commit", failure))
    }

    /// Enables hosting and waits for it to report ready
    ///
    /// Never fails: when hosting cannot be enabled or is not ready in time,
    /// the conventional URL is returned.
    async fn ensure_hosting(&self, repo: &RepositoryInfo) -> String {
        let fallback = default_hosting_url(self.source_control.owner(), &repo.name);
        let source_control = &self.source_control;

        let enabled = self
            .retry
            .run(
                "hosting activation",
                |_| async move { source_control.enable_hosting(repo).await },
                UpstreamError::is_transient,
            )
            .await;

        match enabled {
            Ok(_) => info!(repository = %repo.name, "Hosting enabled"),
            Err(RetryFailure {
                error: UpstreamError::AlreadyExists(_),
                ..
            }) => debug!(repository = %repo.name, "Hosting already enabled"),
            Err(failure) => {
                warn!(
                    repository = %repo.name,
                    attempts = failure.attempts,
                    "Could not enable hosting: {}; using {}",
                    failure.error,
                    fallback
                );
                return fallback;
            }
        }

        for poll in 1..=self.poll_attempts {
            match self.source_control.hosting_status(repo).await {
                Ok(status) if status.ready => {
                    let url = status.url.unwrap_or_else(|| fallback.clone());
                    info!(repository = %repo.name, %url, polls = poll, "Hosting is live");
                    return url;
                }
                Ok(_) => debug!(repository = %repo.name, poll, "Hosting not ready yet"),
                Err(err) => debug!(repository = %repo.name, poll, "Hosting status query failed: {}", err),
            }

            if poll < self.poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        warn!(
            repository = %repo.name,
            polls = self.poll_attempts,
            "Hosting not ready in time; using {}",
            fallback
        );
        fallback
    }
}

fn source_control_error(
    operation: &'static str,
    failure: RetryFailure<UpstreamError>,
) -> DeploymentError {
    DeploymentError::SourceControl {
        operation,
        attempts: failure.attempts,
        source: failure.error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSourceControl, sample_page};
    use shipwright_core::domain::artifact::ROOT_DOCUMENT;
    use std::collections::BTreeMap;
    use tokio::time::Instant;

    fn artifact(title: &str) -> GeneratedArtifact {
        let mut files = BTreeMap::new();
        files.insert(ROOT_DOCUMENT.to_string(), sample_page(title));
        GeneratedArtifact::new(files, true, 1)
    }

    fn deployer(fake: &Arc<FakeSourceControl>) -> RepositoryDeployer {
        let source_control: Arc<dyn SourceControlRepository> = fake.clone();
        RepositoryDeployer::new(
            source_control,
            RetryPolicy::source_control(),
            3,
            Duration::from_secs(6),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_one_creates_repository() {
        let fake = Arc::new(FakeSourceControl::new());

        let result = deployer(&fake).deploy("Task_1", &artifact("A"), 1).await.unwrap();

        assert!(result.created);
        assert!(fake.has_repository("task-1"));
        assert_eq!(result.repository_name, "task-1");
        assert_eq!(result.repository_url, "https://github.com/octo/task-1");
        assert_eq!(result.hosting_url, "https://octo.github.io/task-1/");
        assert_eq!(result.commit_ref, "sha-1");

        let commits = fake.commits();
        assert_eq!(commits.len(), 1);
        assert!(commits[0].message.starts_with("Initial deployment"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_one_redelivery_falls_back_to_update() {
        let fake = Arc::new(FakeSourceControl::new());
        let deployer = deployer(&fake);

        let first = deployer.deploy("t1", &artifact("A"), 1).await.unwrap();
        let second = deployer.deploy("t1", &artifact("A"), 1).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.repository_name, "t1");
        assert_eq!(fake.create_calls(), 2);
        assert_eq!(fake.commits().len(), 2);
        assert!(fake.commits()[1].message.starts_with("Round 1 update"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_revision_of_missing_repository_fails() {
        let fake = Arc::new(FakeSourceControl::new());

        let err = deployer(&fake).deploy("ghost", &artifact("A"), 2).await.unwrap_err();

        assert_eq!(
            err,
            DeploymentError::MissingRepository {
                repository: "ghost".to_string(),
                round: 2
            }
        );
        assert!(fake.commits().is_empty());
        assert_eq!(fake.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revision_updates_existing_repository() {
        let fake = Arc::new(FakeSourceControl::new());
        fake.add_repository("t1");

        let result = deployer(&fake).deploy("t1", &artifact("B"), 2).await.unwrap();

        assert!(!result.created);
        let commits = fake.commits();
        assert_eq!(commits[0].message, "Round 2 update: revised application (1 files)");
        assert_eq!(commits[0].files[ROOT_DOCUMENT], sample_page("B"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_commit_failures_back_off() {
        let fake = Arc::new(FakeSourceControl::new());
        fake.add_repository("t1");
        fake.fail_next_commit(UpstreamError::Transient("429".to_string()));
        fake.fail_next_commit(UpstreamError::Transient("502".to_string()));

        let started = Instant::now();
        let result = deployer(&fake).deploy("t1", &artifact("A"), 2).await.unwrap();

        assert_eq!(result.commit_ref, "sha-1");
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_commit_is_not_retried() {
        let fake = Arc::new(FakeSourceControl::new());
        fake.add_repository("t1");
        fake.fail_next_commit(UpstreamError::Rejected("403".to_string()));

        let err = deployer(&fake).deploy("t1", &artifact("A"), 2).await.unwrap_err();

        assert!(matches!(
            err,
            DeploymentError::SourceControl {
                operation: "commit",
                attempts: 1,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_creation_retries_fail() {
        let fake = Arc::new(FakeSourceControl::new());
        for _ in 0..5 {
            fake.fail_next_create(UpstreamError::Transient("503".to_string()));
        }

        let err = deployer(&fake).deploy("t1", &artifact("A"), 1).await.unwrap_err();

        assert!(matches!(
            err,
            DeploymentError::SourceControl {
                operation: "repository creation",
                attempts: 5,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_hosting_falls_back_to_default_url() {
        let fake = Arc::new(FakeSourceControl::new());
        fake.fail_next_hosting(UpstreamError::Rejected("403 pages not allowed".to_string()));

        let result = deployer(&fake).deploy("t1", &artifact("A"), 1).await.unwrap();

        assert!(result.created);
        assert_eq!(result.hosting_url, "https://octo.github.io/t1/");
        assert_eq!(result.commit_ref, "sha-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_hosting_is_not_a_failure() {
        let fake = Arc::new(FakeSourceControl::new().with_hosting_ready_after(0));

        let started = Instant::now();
        let result = deployer(&fake).deploy("t1", &artifact("A"), 1).await.unwrap();

        assert_eq!(result.hosting_url, "https://octo.github.io/t1/");
        assert_eq!(started.elapsed(), Duration::from_secs(12));
    }
}
