//! API Error Handling
//!
//! Every error response carries a `{"error": "..."}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shipwright_runner::DispatchError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::AtCapacity { .. } => ApiError::ServiceUnavailable(err.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
