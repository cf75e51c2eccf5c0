//! Remote tool access for the knowledge-graph chat service.
//!
//! Tools live on an MCP server reached over streamable HTTP. Every call opens
//! its own session and closes it afterwards; nothing is pooled between calls.
//! [`RemoteToolBridge`] exposes that async protocol to synchronous callers.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod bridge;
mod client;
mod connector;
mod error;
mod types;

pub use bridge::RemoteToolBridge;
pub use client::{McpConnector, McpSession};
pub use connector::{ToolConnector, ToolSession};
pub use error::{McpError, McpResult};
pub use types::{ToolContent, ToolResult};
