//! LLM-related error types.

use thiserror::Error;

/// Errors that can occur with LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// A remote endpoint was configured without credentials.
    #[error("API key not configured for {provider}")]
    ApiKeyNotConfigured {
        /// Provider name.
        provider: String,
    },

    /// The request could not be sent or timed out.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// The endpoint answered with an error status or an unexpected body.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;
