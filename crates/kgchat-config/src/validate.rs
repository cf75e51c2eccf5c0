//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound on reasoning steps per request.
const MAX_ITERATIONS_UPPER_BOUND: u32 = 100;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_server(config)?;
    validate_model(config)?;
    validate_mcp(config)?;
    validate_agent(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_server(config: &Config) -> ConfigResult<()> {
    if config.server.host.trim().is_empty() {
        return Err(invalid("server.host", "host must not be empty"));
    }
    if config.server.port == 0 {
        return Err(invalid("server.port", "port must be between 1 and 65535"));
    }
    Ok(())
}

fn validate_model(config: &Config) -> ConfigResult<()> {
    let m = &config.model;

    if m.alias.trim().is_empty() {
        return Err(invalid("model.alias", "model alias must not be empty"));
    }

    if !(0.0..=2.0).contains(&m.temperature) {
        return Err(invalid(
            "model.temperature",
            format!(
                "temperature {} is out of range; must be between 0.0 and 2.0",
                m.temperature
            ),
        ));
    }

    if m.max_tokens == 0 {
        return Err(invalid("model.max_tokens", "max_tokens must be at least 1"));
    }

    if let Some(url) = &m.service_url
        && !is_http_url(url)
    {
        return Err(invalid(
            "model.service_url",
            format!("'{url}' is not an http(s) URL"),
        ));
    }

    if m.request_timeout_secs == 0 {
        return Err(invalid(
            "model.request_timeout_secs",
            "request timeout must be at least 1 second",
        ));
    }

    Ok(())
}

fn validate_mcp(config: &Config) -> ConfigResult<()> {
    if !is_http_url(&config.mcp.endpoint) {
        return Err(invalid(
            "mcp.endpoint",
            format!("'{}' is not an http(s) URL", config.mcp.endpoint),
        ));
    }
    if config.mcp.graph_tool.trim().is_empty() {
        return Err(invalid("mcp.graph_tool", "tool name must not be empty"));
    }
    if config.mcp.call_timeout_secs == 0 {
        return Err(invalid(
            "mcp.call_timeout_secs",
            "call timeout must be at least 1 second",
        ));
    }
    Ok(())
}

fn validate_agent(config: &Config) -> ConfigResult<()> {
    let a = &config.agent;
    if a.max_iterations == 0 || a.max_iterations > MAX_ITERATIONS_UPPER_BOUND {
        return Err(invalid(
            "agent.max_iterations",
            format!("max_iterations must be between 1 and {MAX_ITERATIONS_UPPER_BOUND}"),
        ));
    }
    if a.max_execution_secs == 0 {
        return Err(invalid(
            "agent.max_execution_secs",
            "execution budget must be at least 1 second",
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;
    if !matches!(
        l.level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        ));
    }
    if !matches!(l.format.as_str(), "pretty" | "compact" | "json") {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: pretty, compact, json",
                l.format
            ),
        ));
    }
    if !matches!(l.rotation.as_str(), "daily" | "hourly" | "never") {
        return Err(invalid(
            "logging.rotation",
            format!(
                "unknown rotation '{}'; expected one of: daily, hourly, never",
                l.rotation
            ),
        ));
    }
    Ok(())
}
