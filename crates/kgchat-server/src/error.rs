//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kgchat_backend::BackendError;
use serde::Serialize;
use thiserror::Error;

/// A failed request, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is missing required input.
    #[error("{0}")]
    BadRequest(String),

    /// The backend has not finished initializing.
    #[error("{0}")]
    NotReady(String),

    /// The agent or one of its tools failed.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotReady => Self::NotReady(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_is_service_unavailable() {
        let err = ApiError::from(BackendError::NotReady);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "AI service not initialized");
    }

    #[test]
    fn test_initialization_failure_is_internal() {
        let err = ApiError::from(BackendError::InitializationFailed {
            reason: "no model".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
