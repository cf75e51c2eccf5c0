//! Seams between the bridge and a concrete tool transport.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::McpResult;
use crate::types::ToolResult;

/// Opens sessions against a remote tool endpoint.
#[async_trait]
pub trait ToolConnector: Send + Sync {
    /// Connect and complete the protocol handshake.
    async fn connect(&self) -> McpResult<Box<dyn ToolSession>>;
}

/// One open session. Consumed by [`ToolSession::close`].
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Invoke `name` with `arguments`.
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolResult>;

    /// Shut the session down.
    async fn close(self: Box<Self>);
}
