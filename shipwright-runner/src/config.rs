//! Runner configuration
//!
//! Every credential, endpoint, timeout and retry schedule the pipeline uses.
//! Built once at startup and passed by reference into each component's
//! constructor; nothing in the pipeline reads the environment directly.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Pipeline configuration
#[derive(Clone)]
pub struct RunnerConfig {
    /// GitHub REST base URL
    pub github_api_url: String,

    /// Token used for every source-control call
    pub github_token: String,

    /// Account owning the deployed repositories
    pub github_owner: String,

    /// OpenAI-compatible completion API base URL
    pub llm_base_url: String,

    pub llm_api_key: String,

    pub llm_model: String,

    pub llm_max_tokens: u32,

    pub llm_temperature: f32,

    /// Timeout of one completion request
    pub llm_timeout: Duration,

    /// Timeout of one source-control or callback request
    pub http_timeout: Duration,

    /// Deadline for generation plus deployment of one job
    pub job_timeout: Duration,

    /// How long a job waits for another round of the same task to finish
    pub lock_timeout: Duration,

    /// Jobs allowed to run at once; submissions beyond this are rejected
    pub max_concurrent_jobs: usize,

    /// Hosting readiness polls after enabling Pages
    pub pages_poll_attempts: u32,

    pub pages_poll_interval: Duration,

    pub generation_retry: RetryPolicy,

    pub source_control_retry: RetryPolicy,

    pub notification_retry: RetryPolicy,
}

impl RunnerConfig {
    /// Creates a configuration with defaults for everything but credentials
    pub fn new(
        github_owner: impl Into<String>,
        github_token: impl Into<String>,
        llm_api_key: impl Into<String>,
    ) -> Self {
        Self {
            github_api_url: "https://api.github.com".to_string(),
            github_token: github_token.into(),
            github_owner: github_owner.into(),
            llm_base_url: "https://openrouter.ai/api/v1".to_string(),
            llm_api_key: llm_api_key.into(),
            llm_model: "openai/gpt-4o-mini".to_string(),
            llm_max_tokens: 4000,
            llm_temperature: 0.7,
            llm_timeout: Duration::from_secs(120),
            http_timeout: Duration::from_secs(30),
            job_timeout: Duration::from_secs(600), // 10 minutes
            lock_timeout: Duration::from_secs(900),
            max_concurrent_jobs: 4,
            pages_poll_attempts: 10,
            pages_poll_interval: Duration::from_secs(6),
            generation_retry: RetryPolicy::generation(),
            source_control_retry: RetryPolicy::source_control(),
            notification_retry: RetryPolicy::notification(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - GITHUB_PAT (required)
    /// - GITHUB_USERNAME (required)
    /// - LLM_API_KEY or OPENROUTER_API_KEY (required)
    /// - GITHUB_API_URL (optional, default: https://api.github.com)
    /// - LLM_BASE_URL (optional, default: https://openrouter.ai/api/v1)
    /// - LLM_MODEL (optional, default: openai/gpt-4o-mini)
    /// - LLM_MAX_TOKENS (optional, default: 4000)
    /// - LLM_TEMPERATURE (optional, default: 0.7)
    /// - LLM_TIMEOUT (optional, seconds, default: 120)
    /// - HTTP_TIMEOUT (optional, seconds, default: 30)
    /// - JOB_TIMEOUT (optional, seconds, default: 600)
    /// - LOCK_TIMEOUT (optional, seconds, default: 900)
    /// - MAX_CONCURRENT_JOBS (optional, default: 4)
    /// - PAGES_POLL_ATTEMPTS (optional, default: 10)
    /// - PAGES_POLL_INTERVAL (optional, seconds, default: 6)
    pub fn from_env() -> anyhow::Result<Self> {
        let github_token = std::env::var("GITHUB_PAT")
            .map_err(|_| anyhow::anyhow!("GITHUB_PAT environment variable not set"))?;

        let github_owner = std::env::var("GITHUB_USERNAME")
            .map_err(|_| anyhow::anyhow!("GITHUB_USERNAME environment variable not set"))?;

        let llm_api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
            .map_err(|_| {
                anyhow::anyhow!("LLM_API_KEY (or OPENROUTER_API_KEY) environment variable not set")
            })?;

        let mut config = Self::new(github_owner, github_token, llm_api_key);

        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            config.github_api_url = url;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm_base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.llm_model = model;
        }

        config.llm_max_tokens = env_parse("LLM_MAX_TOKENS").unwrap_or(config.llm_max_tokens);
        config.llm_temperature = env_parse("LLM_TEMPERATURE").unwrap_or(config.llm_temperature);
        config.llm_timeout = env_secs("LLM_TIMEOUT").unwrap_or(config.llm_timeout);
        config.http_timeout = env_secs("HTTP_TIMEOUT").unwrap_or(config.http_timeout);
        config.job_timeout = env_secs("JOB_TIMEOUT").unwrap_or(config.job_timeout);
        config.lock_timeout = env_secs("LOCK_TIMEOUT").unwrap_or(config.lock_timeout);
        config.max_concurrent_jobs =
            env_parse("MAX_CONCURRENT_JOBS").unwrap_or(config.max_concurrent_jobs);
        config.pages_poll_attempts =
            env_parse("PAGES_POLL_ATTEMPTS").unwrap_or(config.pages_poll_attempts);
        config.pages_poll_interval =
            env_secs("PAGES_POLL_INTERVAL").unwrap_or(config.pages_poll_interval);

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.github_token.is_empty() {
            anyhow::bail!("github_token cannot be empty");
        }

        if self.github_owner.is_empty() {
            anyhow::bail!("github_owner cannot be empty");
        }

        if self.llm_api_key.is_empty() {
            anyhow::bail!("llm_api_key cannot be empty");
        }

        for (name, url) in [
            ("github_api_url", &self.github_api_url),
            ("llm_base_url", &self.llm_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.max_concurrent_jobs == 0 {
            anyhow::bail!("max_concurrent_jobs must be greater than 0");
        }

        if self.job_timeout.is_zero() || self.lock_timeout.is_zero() {
            anyhow::bail!("job_timeout and lock_timeout must be greater than 0");
        }

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            anyhow::bail!("llm_temperature must be between 0.0 and 2.0");
        }

        Ok(())
    }
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("github_api_url", &self.github_api_url)
            .field("github_owner", &self.github_owner)
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("job_timeout", &self.job_timeout)
            .field("lock_timeout", &self.lock_timeout)
            .field("max_concurrent_jobs", &self.max_concurrent_jobs)
            .finish_non_exhaustive()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn env_secs(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_secs)
}
