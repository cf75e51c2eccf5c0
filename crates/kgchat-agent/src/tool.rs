//! Tool capabilities the agent can dispatch to.

use std::time::Duration;

use kgchat_mcp::RemoteToolBridge;
use serde_json::Value;
use tracing::debug;

use crate::error::ToolError;

/// A capability the model may invoke by name.
///
/// `invoke` is synchronous; implementations that reach async clients bridge
/// internally.
pub trait AgentTool: Send + Sync {
    /// Name the model uses in `Action:` lines.
    fn name(&self) -> &str;

    /// One-line description shown in the prompt.
    fn description(&self) -> &str;

    /// Run the tool with the model's action input and return the observation.
    ///
    /// `budget` is what is left of the run's wall-clock allowance; the call
    /// must give up once it is spent.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the input is unusable or the call fails.
    fn invoke(&self, input: &str, budget: Duration) -> Result<String, ToolError>;
}

/// Reads the whole knowledge graph from the remote tool server.
#[derive(Debug, Clone)]
pub struct ReadGraphTool {
    bridge: RemoteToolBridge,
    remote_name: String,
}

impl ReadGraphTool {
    /// Tool name presented to the model.
    pub const NAME: &'static str = "read_graph";

    /// Create the tool. `remote_name` is the tool's name on the server.
    #[must_use]
    pub fn new(bridge: RemoteToolBridge, remote_name: impl Into<String>) -> Self {
        Self {
            bridge,
            remote_name: remote_name.into(),
        }
    }
}

impl AgentTool for ReadGraphTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Read the knowledge graph."
    }

    fn invoke(&self, input: &str, budget: Duration) -> Result<String, ToolError> {
        // The graph is always read in full; the model's input is informational.
        debug!(
            tool = %self.remote_name,
            input,
            budget_ms = budget.as_millis(),
            "Reading knowledge graph"
        );
        let result = self.bridge.call_tool_within(
            &self.remote_name,
            Value::Object(serde_json::Map::new()),
            budget,
        )?;
        Ok(result.text_content())
    }
}
