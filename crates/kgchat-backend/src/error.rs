//! Backend error types.

use thiserror::Error;

/// Failures talking to the local model runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime CLI could not be located.
    #[error("Cannot find runtime binary {binary}: {reason}")]
    BinaryNotFound {
        /// Binary name or path.
        binary: String,
        /// Lookup failure.
        reason: String,
    },

    /// A runtime CLI command failed.
    #[error("Command `{command}` failed: {reason}")]
    CommandFailed {
        /// Command line that was run.
        command: String,
        /// Exit status or stderr.
        reason: String,
    },

    /// The runtime service is not reachable.
    #[error("Model runtime service unavailable: {0}")]
    ServiceUnavailable(String),

    /// No catalog entry matches the requested alias.
    #[error("Model {alias} not found in the runtime catalog")]
    ModelNotFound {
        /// Requested alias.
        alias: String,
    },

    /// The runtime refused to load a model.
    #[error("Failed to load model {model}: {reason}")]
    LoadFailed {
        /// Model id.
        model: String,
        /// Failure detail.
        reason: String,
    },

    /// An HTTP exchange with the runtime failed.
    #[error("Runtime request failed: {0}")]
    Http(String),
}

impl From<reqwest::Error> for RuntimeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors surfaced by [`BackendLifecycle`](crate::BackendLifecycle).
#[derive(Debug, Error)]
pub enum BackendError {
    /// Initialization has not completed.
    #[error("AI service not initialized")]
    NotReady,

    /// The single initialization attempt failed.
    #[error("Initialization failed: {reason}")]
    InitializationFailed {
        /// Recorded failure reason.
        reason: String,
    },

    /// A model runtime step failed.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The language-model client could not be configured.
    #[error(transparent)]
    Llm(#[from] kgchat_llm::LlmError),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
