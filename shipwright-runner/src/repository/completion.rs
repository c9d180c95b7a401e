//! Completion repository

use async_trait::async_trait;
use shipwright_client::{ClientError, CompletionClient};

use crate::error::UpstreamError;

/// A single prompt-in, text-out exchange with a language model
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Sends a system message and a user prompt, returning the reply text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, UpstreamError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// HTTP implementation backed by an OpenAI-compatible API
pub struct HttpCompletionRepository {
    client: CompletionClient,
}

impl HttpCompletionRepository {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionRepository for HttpCompletionRepository {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, UpstreamError> {
        self.client
            .complete(system, prompt)
            .await
            .map_err(|err| match err {
                // Choice-less or truncated bodies count as transient.
                ClientError::ParseError(message) => UpstreamError::Transient(message),
                other => UpstreamError::from(other),
            })
    }

    fn model(&self) -> &str {
        self.client.model()
    }
}
