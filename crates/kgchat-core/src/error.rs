//! Bridge error types.

use thiserror::Error;

/// Errors raised while driving a future from a synchronous call site.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A dedicated runtime could not be created.
    #[error("Failed to build a dedicated async runtime: {0}")]
    RuntimeBuild(#[from] std::io::Error),

    /// The task was dropped (panicked or its runtime shut down) before
    /// reporting a result.
    #[error("Async task ended before producing a result")]
    TaskAborted,
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
