//! Initialization parameters.

use std::time::Duration;

use kgchat_agent::AgentSettings;
use kgchat_config::Config;

/// Stop sequence that ends a model turn before it invents an observation.
pub const REACT_STOP_SEQUENCE: &str = "\nObservation:";

/// Everything [`BackendLifecycle`](crate::BackendLifecycle) needs to build the
/// resource bundle.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Model alias to load.
    pub model_alias: String,
    /// Sampling temperature for the agent model.
    pub temperature: f64,
    /// Completion token cap.
    pub max_tokens: usize,
    /// Per-request model timeout.
    pub request_timeout: Duration,
    /// Name of the graph tool on the remote server.
    pub graph_tool: String,
    /// Per-call remote tool timeout.
    pub tool_timeout: Duration,
    /// Agent budgets and recovery policy.
    pub agent: AgentSettings,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl BackendSettings {
    /// Derive settings from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            model_alias: config.model.alias.clone(),
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
            request_timeout: Duration::from_secs(config.model.request_timeout_secs),
            graph_tool: config.mcp.graph_tool.clone(),
            tool_timeout: Duration::from_secs(config.mcp.call_timeout_secs),
            agent: AgentSettings {
                max_iterations: config.agent.max_iterations,
                max_execution: Duration::from_secs(config.agent.max_execution_secs),
                handle_parsing_errors: config.agent.handle_parsing_errors,
                handle_tool_errors: config.agent.handle_tool_errors,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config_defaults() {
        let settings = BackendSettings::default();
        assert_eq!(settings.model_alias, "phi-3.5-mini");
        assert_eq!(settings.graph_tool, "read_graph");
        assert_eq!(settings.agent.max_iterations, 3);
        assert_eq!(settings.agent.max_execution, Duration::from_secs(30));
        assert!(settings.agent.handle_parsing_errors);
        assert!(!settings.agent.handle_tool_errors);
    }

    #[test]
    fn test_from_config_overrides() {
        let mut config = Config::default();
        config.model.alias = "qwen2.5-0.5b".to_string();
        config.agent.max_iterations = 7;

        let settings = BackendSettings::from_config(&config);
        assert_eq!(settings.model_alias, "qwen2.5-0.5b");
        assert_eq!(settings.agent.max_iterations, 7);
    }
}
