//! In-memory repositories for pipeline tests

use async_trait::async_trait;
use shipwright_core::domain::deployment::{HostingStatus, RepositoryInfo};
use shipwright_core::domain::job::JobRequest;
use shipwright_core::dto::notification::EvaluationNotice;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::RunnerConfig;
use crate::error::UpstreamError;
use crate::orchestrator::JobOrchestrator;
use crate::repository::{CallbackRepository, CompletionRepository, SourceControlRepository};

pub const OWNER: &str = "octo";

/// A complete page that passes structural validation
pub fn sample_page(title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n<body><h1 id=\"title\">{title}</h1></body>\n</html>"
    )
}

pub fn sample_request(task_id: &str, round: u32) -> JobRequest {
    JobRequest {
        email: "student@example.com".to_string(),
        task_id: task_id.to_string(),
        round,
        nonce: format!("nonce-{}-{}", task_id, round),
        brief: "Show a page with a #title heading".to_string(),
        checks: vec!["#title is visible".to_string()],
        evaluation_callback: "https://eval.example.com/notify".to_string(),
        attachments: vec![],
    }
}

/// Scripted completion backend
///
/// Pops queued replies in order; once the queue is empty every call gets
/// the fallback reply, or a transient error when there is none.
pub struct MockCompletion {
    replies: Mutex<VecDeque<Result<String, UpstreamError>>>,
    fallback: Option<String>,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: None,
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, reply: Result<String, UpstreamError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionRepository for MockCompletion {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| UpstreamError::Transient("no scripted reply".to_string())),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommit {
    pub repository: String,
    pub files: BTreeMap<String, String>,
    pub message: String,
}

#[derive(Default)]
struct SourceControlState {
    repositories: BTreeMap<String, RepositoryInfo>,
    commits: Vec<RecordedCommit>,
    create_calls: u32,
    create_failures: VecDeque<UpstreamError>,
    commit_failures: VecDeque<UpstreamError>,
    hosting_failures: VecDeque<UpstreamError>,
    hosting_enabled: BTreeSet<String>,
    status_polls: u32,
}

/// In-memory source-control host
pub struct FakeSourceControl {
    state: Mutex<SourceControlState>,
    commit_delay: Option<Duration>,
    ready_after_polls: u32,
    active_commits: AtomicUsize,
    max_active_commits: AtomicUsize,
}

impl FakeSourceControl {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SourceControlState::default()),
            commit_delay: None,
            ready_after_polls: 1,
            active_commits: AtomicUsize::new(0),
            max_active_commits: AtomicUsize::new(0),
        }
    }

    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    /// Hosting reports ready on the `polls`-th status query; 0 means never
    pub fn with_hosting_ready_after(mut self, polls: u32) -> Self {
        self.ready_after_polls = polls;
        self
    }

    pub fn add_repository(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .repositories
            .insert(name.to_string(), Self::info(name));
    }

    pub fn fail_next_create(&self, error: UpstreamError) {
        self.state.lock().unwrap().create_failures.push_back(error);
    }

    pub fn fail_next_commit(&self, error: UpstreamError) {
        self.state.lock().unwrap().commit_failures.push_back(error);
    }

    pub fn fail_next_hosting(&self, error: UpstreamError) {
        self.state.lock().unwrap().hosting_failures.push_back(error);
    }

    pub fn has_repository(&self, name: &str) -> bool {
        self.state.lock().unwrap().repositories.contains_key(name)
    }

    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.state.lock().unwrap().commits.clone()
    }

    pub fn create_calls(&self) -> u32 {
        self.state.lock().unwrap().create_calls
    }

    pub fn max_concurrent_commits(&self) -> usize {
        self.max_active_commits.load(Ordering::SeqCst)
    }

    fn info(name: &str) -> RepositoryInfo {
        RepositoryInfo {
            name: name.to_string(),
            html_url: format!("https://github.com/{}/{}", OWNER, name),
            default_branch: "main".to_string(),
        }
    }
}

#[async_trait]
impl SourceControlRepository for FakeSourceControl {
    fn owner(&self) -> &str {
        OWNER
    }

    async fn create_repository(
        &self,
        name: &str,
        _description: &str,
    ) -> Result<RepositoryInfo, UpstreamError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        if let Some(error) = state.create_failures.pop_front() {
            return Err(error);
        }
        if state.repositories.contains_key(name) {
            return Err(UpstreamError::AlreadyExists(name.to_string()));
        }
        let info = Self::info(name);
        state.repositories.insert(name.to_string(), info.clone());
        Ok(info)
    }

    async fn get_repository(&self, name: &str) -> Result<RepositoryInfo, UpstreamError> {
        self.state
            .lock()
            .unwrap()
            .repositories
            .get(name)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(name.to_string()))
    }

    async fn commit_files(
        &self,
        repo: &RepositoryInfo,
        files: &BTreeMap<String, String>,
        message: &str,
    ) -> Result<String, UpstreamError> {
        let active = self.active_commits.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_commits.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.commit_delay {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut state = self.state.lock().unwrap();
            if let Some(error) = state.commit_failures.pop_front() {
                Err(error)
            } else if !state.repositories.contains_key(&repo.name) {
                Err(UpstreamError::NotFound(repo.name.clone()))
            } else {
                state.commits.push(RecordedCommit {
                    repository: repo.name.clone(),
                    files: files.clone(),
                    message: message.to_string(),
                });
                Ok(format!("sha-{}", state.commits.len()))
            }
        };

        self.active_commits.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn enable_hosting(&self, repo: &RepositoryInfo) -> Result<(), UpstreamError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.hosting_failures.pop_front() {
            return Err(error);
        }
        if state.hosting_enabled.insert(repo.name.clone()) {
            Ok(())
        } else {
            Err(UpstreamError::AlreadyExists(repo.name.clone()))
        }
    }

    async fn hosting_status(&self, repo: &RepositoryInfo) -> Result<HostingStatus, UpstreamError> {
        let mut state = self.state.lock().unwrap();
        state.status_polls += 1;
        let ready = self.ready_after_polls > 0 && state.status_polls >= self.ready_after_polls;
        Ok(HostingStatus {
            ready,
            url: ready.then(|| format!("https://{}.github.io/{}/", OWNER, repo.name)),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub url: String,
    pub notice: EvaluationNotice,
    pub at: Instant,
}

/// Callback endpoint that records every delivery attempt
pub struct RecordingCallback {
    script: Mutex<VecDeque<Result<(), UpstreamError>>>,
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Queues results for the next attempts; unscripted attempts succeed
    pub fn push(&self, result: Result<(), UpstreamError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallbackRepository for RecordingCallback {
    async fn deliver(&self, url: &str, notice: &EvaluationNotice) -> Result<(), UpstreamError> {
        self.deliveries.lock().unwrap().push(Delivery {
            url: url.to_string(),
            notice: notice.clone(),
            at: Instant::now(),
        });
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

/// An orchestrator wired to in-memory repositories
pub struct Harness {
    pub orchestrator: Arc<JobOrchestrator>,
    pub completion: Arc<MockCompletion>,
    pub source_control: Arc<FakeSourceControl>,
    pub callback: Arc<RecordingCallback>,
}

impl Harness {
    pub fn config() -> RunnerConfig {
        let mut config = RunnerConfig::new(OWNER, "ghp_test", "sk-test");
        config.pages_poll_attempts = 2;
        config.pages_poll_interval = Duration::from_secs(1);
        config
    }

    pub fn new(completion: MockCompletion, source_control: FakeSourceControl) -> Self {
        Self::with_config(&Self::config(), completion, source_control)
    }

    pub fn with_config(
        config: &RunnerConfig,
        completion: MockCompletion,
        source_control: FakeSourceControl,
    ) -> Self {
        let completion = Arc::new(completion);
        let source_control = Arc::new(source_control);
        let callback = Arc::new(RecordingCallback::new());

        let orchestrator = JobOrchestrator::new(
            config,
            completion.clone(),
            source_control.clone(),
            callback.clone(),
        );

        Self {
            orchestrator: Arc::new(orchestrator),
            completion,
            source_control,
            callback,
        }
    }
}
