//! Evaluation callback client

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Posts JSON bodies to caller-supplied callback URLs
#[derive(Debug, Clone)]
pub struct CallbackClient {
    client: Client,
}

impl CallbackClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: crate::http_client(timeout)?,
        })
    }

    /// POST `body` to `url`; any non-2xx status is an error
    pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidRequest(format!(
                "callback URL must be http(s): {}",
                url
            )));
        }

        let response = self.client.post(url).json(body).send().await?;
        tracing::debug!(url = %url, status = %response.status(), "Callback responded");

        crate::handle_empty_response(response).await
    }
}
