//! Gateway API client

use reqwest::Client;
use shipwright_core::dto::task::{HealthReport, SubmissionAck, TaskSubmission};

use crate::error::Result;

/// HTTP client for the Shipwright gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    /// Base URL of the gateway (e.g., "http://localhost:3000")
    base_url: String,
    client: Client,
}

impl GatewayClient {
    /// Create a new gateway client
    ///
    /// # Example
    /// ```
    /// use shipwright_client::GatewayClient;
    ///
    /// let client = GatewayClient::new("http://localhost:3000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Get the base URL of the gateway
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a task for background processing
    pub async fn submit_task(&self, submission: &TaskSubmission) -> Result<SubmissionAck> {
        let url = format!("{}/api-endpoint", self.base_url);
        let response = self.client.post(&url).json(submission).send().await?;

        crate::handle_response(response).await
    }

    /// Fetch the gateway health report
    pub async fn health(&self) -> Result<HealthReport> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        crate::handle_response(response).await
    }
}
