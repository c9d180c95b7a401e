//! Gateway configuration

use shipwright_runner::RunnerConfig;
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Gateway configuration
#[derive(Clone)]
pub struct GatewayConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,

    /// Secret every submission must carry
    pub shared_secret: String,

    /// Pipeline settings
    pub runner: RunnerConfig,
}

impl GatewayConfig {
    pub fn new(shared_secret: impl Into<String>, runner: RunnerConfig) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            shared_secret: shared_secret.into(),
            runner,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SHARED_SECRET (required)
    /// - BIND_ADDR (optional, default: 0.0.0.0:3000)
    /// - PORT (optional, used when BIND_ADDR is unset)
    /// - everything [`RunnerConfig::from_env`] reads
    pub fn from_env() -> anyhow::Result<Self> {
        let shared_secret = std::env::var("SHARED_SECRET")
            .map_err(|_| anyhow::anyhow!("SHARED_SECRET environment variable not set"))?;

        let runner = RunnerConfig::from_env()?;
        let mut config = Self::new(shared_secret, runner);

        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.bind_addr = addr;
        } else if let Ok(port) = std::env::var("PORT") {
            config.bind_addr = format!("0.0.0.0:{}", port.trim());
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.shared_secret.trim().is_empty() {
            anyhow::bail!("shared_secret cannot be empty");
        }

        if self.bind_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("bind_addr '{}' is not a valid socket address", self.bind_addr);
        }

        self.runner.validate()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}
