//! Common imports for code that calls remote tools.

pub use crate::{
    McpConnector, McpError, McpResult, RemoteToolBridge, ToolConnector, ToolContent, ToolResult,
    ToolSession,
};
