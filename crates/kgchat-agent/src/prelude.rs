//! Common imports for code that builds or drives an agent.

pub use crate::{
    Agent, AgentError, AgentResult, AgentSettings, AgentTool, ReadGraphTool, ToolError,
};
