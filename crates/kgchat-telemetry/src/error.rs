//! Telemetry error types.

use thiserror::Error;

/// Errors raised while configuring logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level or a directive could not be parsed.
    #[error("invalid logging configuration: {0}")]
    ConfigError(String),

    /// A global subscriber is already installed.
    #[error("failed to initialize logging: {0}")]
    InitError(String),

    /// The log directory could not be prepared.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
