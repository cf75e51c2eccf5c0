//! Synchronous entry point for remote tool calls.

use std::sync::Arc;
use std::time::Duration;

use kgchat_core::ExecutionContext;
use serde_json::Value;
use tracing::{debug, warn};

use crate::connector::ToolConnector;
use crate::error::{McpError, McpResult};
use crate::types::ToolResult;

/// Calls remote tools from code that is not itself async.
///
/// Each call connects, invokes and closes. The execution context is picked
/// per call through [`ExecutionContext::detect`].
#[derive(Clone)]
pub struct RemoteToolBridge {
    connector: Arc<dyn ToolConnector>,
    timeout: Duration,
}

impl std::fmt::Debug for RemoteToolBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteToolBridge")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RemoteToolBridge {
    /// Create a bridge that bounds every call by `timeout`.
    #[must_use]
    pub fn new(connector: Arc<dyn ToolConnector>, timeout: Duration) -> Self {
        Self { connector, timeout }
    }

    /// Invoke `name` with `arguments` and block until it finishes.
    ///
    /// # Errors
    ///
    /// Any transport, protocol or timeout failure, and tool results flagged
    /// as errors, come back as a single [`McpError`].
    pub fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolResult> {
        self.call_tool_within(name, arguments, self.timeout)
    }

    /// Like [`call_tool`](Self::call_tool), but bounded by the shorter of
    /// `limit` and the bridge timeout.
    ///
    /// # Errors
    ///
    /// See [`call_tool`](Self::call_tool).
    pub fn call_tool_within(
        &self,
        name: &str,
        arguments: Value,
        limit: Duration,
    ) -> McpResult<ToolResult> {
        let context = ExecutionContext::detect();
        debug!(
            tool = name,
            existing_runtime = context.is_existing(),
            "Bridging remote tool call"
        );

        let connector = Arc::clone(&self.connector);
        let timeout = self.timeout.min(limit);
        let tool = name.to_string();

        context.run(async move {
            // A timed-out call drops its session, which cancels the service.
            tokio::time::timeout(timeout, scoped_call(connector, &tool, arguments))
                .await
                .unwrap_or(Err(McpError::Timeout { after: timeout }))
        })?
    }
}

async fn scoped_call(
    connector: Arc<dyn ToolConnector>,
    tool: &str,
    arguments: Value,
) -> McpResult<ToolResult> {
    let session = connector.connect().await?;
    let outcome = session.call_tool(tool, arguments).await;
    session.close().await;

    let result = outcome?;
    if result.is_error {
        let message = result.text_content();
        warn!(tool, error = %message, "Remote tool reported an error");
        return Err(McpError::ToolReturnedError {
            tool: tool.to_string(),
            message: if message.is_empty() {
                "unknown error".to_string()
            } else {
                message
            },
        });
    }
    Ok(result)
}
