//! Chat-completions client
//!
//! Speaks the OpenAI-compatible `POST {base}/chat/completions` protocol, which
//! OpenRouter and most hosted gateways implement.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Model parameters for completion requests
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// HTTP client for an OpenAI-compatible completion API
#[derive(Debug, Clone)]
pub struct CompletionClient {
    base_url: String,
    api_key: String,
    settings: CompletionSettings,
    client: Client,
}

impl CompletionClient {
    /// Create a new completion client
    ///
    /// # Arguments
    /// * `base_url` - API base, e.g. "https://openrouter.ai/api/v1"
    /// * `api_key` - Bearer token
    /// * `settings` - Model identifier, budget and request timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        settings: CompletionSettings,
    ) -> Result<Self> {
        let client = crate::http_client(settings.timeout)?;
        let base_url = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            settings,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Send one system + user exchange and return the assistant's text
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        tracing::debug!(model = %self.settings.model, prompt_len = prompt.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: ChatResponse = crate::handle_response(response).await?;
        body.into_text()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClientError::ParseError("completion response has no choices".to_string()))
    }
}
