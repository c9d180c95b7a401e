//! Shipwright HTTP Clients
//!
//! Small, type-safe HTTP clients for every upstream the pipeline talks to:
//!
//! - [`CompletionClient`]: OpenAI-compatible chat completions
//! - [`GitHubClient`]: repositories, git data and Pages
//! - [`CallbackClient`]: JSON POSTs to evaluation callbacks
//! - [`GatewayClient`]: the Shipwright gateway itself (used by the CLI)
//!
//! Every client reports failures as [`ClientError`], which can tell "not
//! found", "conflict" and transient failures apart.
//!
//! # Example
//!
//! ```no_run
//! use shipwright_client::GatewayClient;
//!
//! #[tokio::main]
//! async fn main() -> shipwright_client::Result<()> {
//!     let client = GatewayClient::new("http://localhost:3000");
//!     let health = client.health().await?;
//!     println!("gateway is {}", health.status);
//!     Ok(())
//! }
//! ```

mod callback;
mod completion;
pub mod error;
mod gateway;
mod github;

pub use callback::CallbackClient;
pub use completion::{CompletionClient, CompletionSettings};
pub use error::{ClientError, Result};
pub use gateway::GatewayClient;
pub use github::GitHubClient;

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("shipwright/", env!("CARGO_PKG_VERSION"));

/// Builds a reqwest client with an overall request timeout
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ClientError::from)
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Handle an API response and deserialize JSON
///
/// Checks the status code and returns an [`ClientError::ApiError`] if the
/// request failed, or deserializes the response body if successful.
pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Handle an API response whose body is irrelevant
pub(crate) async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(())
}
