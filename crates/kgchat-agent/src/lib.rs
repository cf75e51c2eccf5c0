//! Reasoning agent for the knowledge-graph chat service.
//!
//! The agent follows the zero-shot ReAct pattern: the model is shown the
//! available tools, emits `Action` / `Action Input` pairs that the agent
//! executes, sees each result as an `Observation`, and stops once it writes a
//! `Final Answer`. Every run is bounded by an iteration cap and a wall-clock
//! budget.
//!
//! [`Agent::run`] is synchronous. Model calls and tool calls are bridged onto
//! the async clients through [`kgchat_core::block_on`], so handlers should
//! call it from a blocking thread.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod agent;
mod error;
mod prompt;
mod react;
mod tool;

pub use agent::{Agent, AgentSettings};
pub use error::{AgentError, AgentResult, ToolError};
pub use react::{ParseError, ReactStep, parse_step};
pub use tool::{AgentTool, ReadGraphTool};
