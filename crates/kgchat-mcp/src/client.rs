//! rmcp-backed connector over streamable HTTP.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::ServiceExt;
use rmcp::model::CallToolRequestParams;
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::connector::{ToolConnector, ToolSession};
use crate::error::{McpError, McpResult};
use crate::types::ToolResult;

const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects to an MCP server at a fixed streamable HTTP endpoint.
#[derive(Debug, Clone)]
pub struct McpConnector {
    endpoint: String,
    close_timeout: Duration,
}

impl McpConnector {
    /// Create a connector for `endpoint` (e.g. `http://localhost:3000/mcp`).
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    /// How long a session may take to shut down before it is dropped.
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Endpoint sessions are opened against.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ToolConnector for McpConnector {
    async fn connect(&self) -> McpResult<Box<dyn ToolSession>> {
        debug!(endpoint = %self.endpoint, "Opening MCP session");

        let transport = StreamableHttpClientTransport::from_uri(self.endpoint.as_str());
        let service = ().serve(transport).await.map_err(|e| {
            McpError::ConnectionFailed(format!("handshake with {} failed: {e}", self.endpoint))
        })?;

        if let Some(info) = service.peer_info() {
            debug!(
                endpoint = %self.endpoint,
                server = %info.server_info.name,
                "MCP session established"
            );
        }

        Ok(Box::new(McpSession {
            service,
            close_timeout: self.close_timeout,
        }))
    }
}

/// An open MCP client session.
pub struct McpSession {
    service: RunningService<RoleClient, ()>,
    close_timeout: Duration,
}

impl std::fmt::Debug for McpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpSession")
            .field("close_timeout", &self.close_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolSession for McpSession {
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolResult> {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            },
        };

        let params = CallToolRequestParams {
            meta: None,
            name: Cow::Owned(name.to_string()),
            arguments,
            task: None,
        };

        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed {
                tool: name.to_string(),
                reason: e.to_string(),
            })?;

        info!(tool = name, "Tool call completed");
        Ok(ToolResult::from(result))
    }

    async fn close(self: Box<Self>) {
        let mut this = *self;
        match this.service.close_with_timeout(this.close_timeout).await {
            Ok(Some(reason)) => debug!(?reason, "MCP session closed"),
            Ok(None) => warn!(
                timeout_secs = this.close_timeout.as_secs(),
                "MCP session close timed out; dropping"
            ),
            Err(e) => warn!(error = %e, "MCP session close join error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_keeps_endpoint() {
        let connector = McpConnector::new("http://localhost:3000/mcp")
            .with_close_timeout(Duration::from_secs(1));
        assert_eq!(connector.endpoint(), "http://localhost:3000/mcp");
        assert_eq!(connector.close_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = McpConnector::new(format!("http://{addr}/mcp"));
        let outcome = tokio::time::timeout(Duration::from_secs(10), connector.connect())
            .await
            .unwrap();

        match outcome {
            Err(McpError::ConnectionFailed(reason)) => {
                assert!(reason.contains(&addr.to_string()));
            },
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connected to a closed port"),
        }
    }
}
