//! Configuration types for the chat service.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a partial file only needs to name what it changes.

use std::path::PathBuf;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener.
    pub server: ServerSection,
    /// Local model runtime and sampling.
    pub model: ModelSection,
    /// Remote knowledge-graph tool endpoint.
    pub mcp: McpSection,
    /// Reasoning loop budgets.
    pub agent: AgentSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ServerSection
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Allow cross-origin requests from any origin.
    pub cors: bool,
    /// Seconds in-flight requests may run after a termination signal.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3002,
            cors: true,
            shutdown_grace_secs: 2,
        }
    }
}

impl ServerSection {
    /// `host:port` string suitable for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// How long in-flight requests may run after a termination signal.
    #[must_use]
    pub fn shutdown_grace(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.shutdown_grace_secs)
    }
}

// ---------------------------------------------------------------------------
// ModelSection
// ---------------------------------------------------------------------------

/// Model runtime selection and sampling parameters.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Catalog alias of the model to load.
    pub alias: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to request per completion.
    pub max_tokens: usize,
    /// Base URL of an already running runtime service. When set, the CLI is
    /// never consulted for discovery.
    pub service_url: Option<String>,
    /// Runtime CLI executable (name on `PATH` or absolute path).
    pub foundry_bin: String,
    /// API key presented to the runtime's OpenAI-compatible endpoint.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Timeout for runtime management requests, including model loads.
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for ModelSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSection")
            .field("alias", &self.alias)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("service_url", &self.service_url)
            .field("foundry_bin", &self.foundry_bin)
            .field("has_api_key", &self.api_key.is_some())
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Serialize for ModelSection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ModelSection", 6)?;
        state.serialize_field("alias", &self.alias)?;
        state.serialize_field("temperature", &self.temperature)?;
        state.serialize_field("max_tokens", &self.max_tokens)?;
        state.serialize_field("service_url", &self.service_url)?;
        state.serialize_field("foundry_bin", &self.foundry_bin)?;
        // api_key is intentionally omitted.
        state.serialize_field("request_timeout_secs", &self.request_timeout_secs)?;
        state.end()
    }
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            alias: "phi-3.5-mini".to_owned(),
            temperature: 0.0,
            max_tokens: 1024,
            service_url: None,
            foundry_bin: "foundry".to_owned(),
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// McpSection
// ---------------------------------------------------------------------------

/// Remote tool endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSection {
    /// Streamable HTTP endpoint of the knowledge-graph server.
    pub endpoint: String,
    /// Name of the graph-read tool on that server.
    pub graph_tool: String,
    /// Upper bound for connect + call + close of a single tool call.
    pub call_timeout_secs: u64,
}

impl Default for McpSection {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/mcp".to_owned(),
            graph_tool: "read_graph".to_owned(),
            call_timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AgentSection
// ---------------------------------------------------------------------------

/// Reasoning loop budgets and recovery policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// Maximum reasoning steps per chat request.
    pub max_iterations: u32,
    /// Wall-clock budget per chat request.
    pub max_execution_secs: u64,
    /// Feed unparseable model output back as an observation instead of failing.
    pub handle_parsing_errors: bool,
    /// Feed tool failures back as an observation instead of failing.
    pub handle_tool_errors: bool,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            max_execution_secs: 30,
            handle_parsing_errors: true,
            handle_tool_errors: false,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"` or `"json"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["kgchat_mcp=debug"]`).
    pub directives: Vec<String>,
    /// Write rolling log files here instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// File rotation: `"daily"`, `"hourly"` or `"never"`.
    pub rotation: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
            rotation: "daily".to_owned(),
        }
    }
}
