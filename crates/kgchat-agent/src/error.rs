//! Agent error types.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The action input could not be used.
    #[error("invalid tool input: {0}")]
    InvalidInput(String),

    /// The remote tool call failed.
    #[error(transparent)]
    Remote(#[from] kgchat_mcp::McpError),
}

/// Errors that end an agent run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model kept acting without reaching a final answer.
    #[error("Agent stopped after reaching the iteration limit of {max_iterations}")]
    IterationLimitExceeded {
        /// Configured cap.
        max_iterations: u32,
    },

    /// The wall-clock budget ran out.
    #[error("Agent stopped after exceeding the time limit of {}s", budget.as_secs())]
    TimeLimitExceeded {
        /// Configured budget.
        budget: Duration,
    },

    /// Model output matched neither an action nor a final answer.
    #[error("Could not parse LLM output: {reason}")]
    OutputParsing {
        /// What was wrong with the output.
        reason: String,
        /// The raw model output.
        output: String,
    },

    /// A tool failed and tool errors are not being fed back to the model.
    #[error("Tool {tool} failed: {source}")]
    Tool {
        /// Tool name.
        tool: String,
        /// Underlying failure.
        #[source]
        source: ToolError,
    },

    /// The model call failed.
    #[error("LLM error: {0}")]
    Llm(#[from] kgchat_llm::LlmError),

    /// The model call could not be driven from this thread.
    #[error("Execution bridge failed: {0}")]
    Bridge(#[from] kgchat_core::BridgeError),
}

impl AgentError {
    /// Whether the run ended because a reasoning budget was exhausted.
    #[must_use]
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(
            self,
            Self::IterationLimitExceeded { .. } | Self::TimeLimitExceeded { .. }
        )
    }
}

/// Result type for agent runs.
pub type AgentResult<T> = Result<T, AgentError>;
