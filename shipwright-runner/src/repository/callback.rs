//! Callback repository

use async_trait::async_trait;
use shipwright_client::{CallbackClient, ClientError};
use shipwright_core::dto::notification::EvaluationNotice;

use crate::error::UpstreamError;

/// Delivers an evaluation notice to a callback URL
#[async_trait]
pub trait CallbackRepository: Send + Sync {
    /// POSTs the notice once; any non-2xx response is an error
    async fn deliver(&self, url: &str, notice: &EvaluationNotice) -> Result<(), UpstreamError>;
}

/// HTTP implementation of CallbackRepository
pub struct HttpCallbackRepository {
    client: CallbackClient,
}

impl HttpCallbackRepository {
    pub fn new(client: CallbackClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CallbackRepository for HttpCallbackRepository {
    async fn deliver(&self, url: &str, notice: &EvaluationNotice) -> Result<(), UpstreamError> {
        self.client
            .post_json(url, notice)
            .await
            .map_err(|err| match err {
                ClientError::InvalidRequest(message) => UpstreamError::Rejected(message),
                // Any non-2xx status is retried, 4xx included.
                other => UpstreamError::Transient(other.to_string()),
            })
    }
}
