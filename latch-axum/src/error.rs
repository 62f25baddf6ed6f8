use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use latch::LatchError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The throttle could not reach a decision
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<LatchError> for ApiError {
    fn from(err: LatchError) -> Self {
        match err {
            LatchError::Infrastructure(msg) => {
                tracing::error!(error = %msg, "Throttle backend unavailable");
                ApiError::Unavailable(msg)
            }
            LatchError::Validation(msg) => ApiError::BadRequest(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // backend details stay in the log
            ApiError::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
