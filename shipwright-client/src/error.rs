//! Error types for the Shipwright clients

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when calling an upstream HTTP API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error body returned by the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of the failed call, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::RequestFailed(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if the resource is in a conflicting state
    ///
    /// GitHub answers 409 for an already enabled pages site and for git data
    /// on a repository that is still empty.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Check if a repository creation failed because the name is taken
    ///
    /// GitHub reports this as a 422 validation error; other 422s (invalid
    /// name, quota) are not conflicts.
    pub fn is_name_taken(&self) -> bool {
        match self {
            Self::ApiError { status: 422, message } => {
                message.to_ascii_lowercase().contains("already exists")
            }
            _ => false,
        }
    }

    /// Check if retrying the same call may succeed
    ///
    /// Network failures, timeouts, 408, 429 and 5xx are transient; other 4xx
    /// responses and unparseable bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(err) => match err.status() {
                Some(status) => status.as_u16() == 429 || status.is_server_error(),
                None => !err.is_builder() && !err.is_decode(),
            },
            Self::ApiError { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::ParseError(_) | Self::InvalidRequest(_) => false,
        }
    }
}
