//! MCP-related error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while calling a remote tool.
#[derive(Debug, Error)]
pub enum McpError {
    /// The endpoint could not be reached.
    #[error("MCP connection failed: {0}")]
    ConnectionFailed(String),

    /// The MCP handshake did not complete.
    #[error("MCP initialization failed: {0}")]
    InitializationFailed(String),

    /// The call was rejected or failed in transit.
    #[error("Tool call failed: {tool} - {reason}")]
    ToolCallFailed {
        /// Tool name.
        tool: String,
        /// Reason for failure.
        reason: String,
    },

    /// The tool ran and reported an error result.
    #[error("Tool {tool} returned an error: {message}")]
    ToolReturnedError {
        /// Tool name.
        tool: String,
        /// Text the tool returned.
        message: String,
    },

    /// Connect, call and close did not finish in time.
    #[error("Tool call timed out after {}ms", after.as_millis())]
    Timeout {
        /// Bound the call ran into.
        after: Duration,
    },

    /// The async call could not be driven from the calling thread.
    #[error("Execution bridge failed: {0}")]
    Bridge(#[from] kgchat_core::BridgeError),

    /// MCP protocol error from rmcp.
    #[error("MCP protocol error: {0}")]
    ProtocolError(String),
}

impl From<rmcp::ServiceError> for McpError {
    fn from(err: rmcp::ServiceError) -> Self {
        Self::ProtocolError(err.to_string())
    }
}

impl From<rmcp::service::ClientInitializeError> for McpError {
    fn from(err: rmcp::service::ClientInitializeError) -> Self {
        Self::InitializationFailed(err.to_string())
    }
}

/// Result type for MCP operations.
pub type McpResult<T> = Result<T, McpError>;
