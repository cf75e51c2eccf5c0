//! Environment variable fallbacks.
//!
//! Environment variables only fill fields that no config file set; a value
//! written in the user file always wins.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "KGCHAT_HOST",
        field_path: "server.host",
    },
    EnvMapping {
        var_name: "KGCHAT_PORT",
        field_path: "server.port",
    },
    EnvMapping {
        var_name: "KGCHAT_MODEL_ALIAS",
        field_path: "model.alias",
    },
    EnvMapping {
        var_name: "KGCHAT_FOUNDRY_URL",
        field_path: "model.service_url",
    },
    EnvMapping {
        var_name: "KGCHAT_MCP_ENDPOINT",
        field_path: "mcp.endpoint",
    },
    EnvMapping {
        var_name: "KGCHAT_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "KGCHAT_LOG_DIR",
        field_path: "logging.directory",
    },
    EnvMapping {
        var_name: "KGCHAT_AGENT_MAX_ITERATIONS",
        field_path: "agent.max_iterations",
    },
    EnvMapping {
        var_name: "KGCHAT_AGENT_MAX_EXECUTION_SECS",
        field_path: "agent.max_execution_secs",
    },
    // Standard OpenAI SDK variable, also honoured by the local runtime.
    EnvMapping {
        var_name: "OPENAI_API_KEY",
        field_path: "model.api_key",
    },
];

/// Apply environment fallbacks to fields not listed in `file_fields`.
///
/// Returns the number of variables applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    file_fields: &BTreeSet<String>,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if file_fields.contains(mapping.field_path) {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field_from_string(merged, mapping.field_path, val);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set a dotted field in the TOML tree, creating intermediate tables.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) {
    let toml_val = coerce_to_toml_value(path, val);

    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), toml_val);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

/// Coerce a string env var value to the TOML type of the target field.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if path == "model.temperature"
        && let Ok(f) = val.parse::<f64>()
    {
        return toml::Value::Float(f);
    }

    if matches!(
        path,
        "server.port"
            | "model.max_tokens"
            | "model.request_timeout_secs"
            | "mcp.call_timeout_secs"
            | "agent.max_iterations"
            | "agent.max_execution_secs"
    ) && let Ok(i) = val.parse::<i64>()
    {
        return toml::Value::Integer(i);
    }

    if matches!(
        path,
        "server.cors" | "agent.handle_parsing_errors" | "agent.handle_tool_errors"
    ) && let Ok(b) = val.parse::<bool>()
    {
        return toml::Value::Boolean(b);
    }

    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn empty_tree() -> toml::Value {
        toml::Value::Table(toml::map::Map::new())
    }

    #[test]
    fn test_fallback_applies_when_unset() {
        let mut tree = empty_tree();
        let env = make_env(&[("KGCHAT_MODEL_ALIAS", "qwen2.5-0.5b")]);

        let applied = apply_env_fallbacks(&mut tree, &BTreeSet::new(), &env);

        assert_eq!(applied, 1);
        assert_eq!(tree["model"]["alias"].as_str(), Some("qwen2.5-0.5b"));
    }

    #[test]
    fn test_fallback_skips_file_fields() {
        let mut tree = empty_tree();
        let env = make_env(&[("KGCHAT_PORT", "9000")]);
        let file_fields: BTreeSet<String> = ["server.port".to_owned()].into();

        let applied = apply_env_fallbacks(&mut tree, &file_fields, &env);

        assert_eq!(applied, 0);
        assert!(tree.get("server").is_none());
    }

    #[test]
    fn test_numeric_coercion() {
        let mut tree = empty_tree();
        let env = make_env(&[
            ("KGCHAT_PORT", "8080"),
            ("KGCHAT_AGENT_MAX_ITERATIONS", "5"),
        ]);

        apply_env_fallbacks(&mut tree, &BTreeSet::new(), &env);

        assert_eq!(tree["server"]["port"].as_integer(), Some(8080));
        assert_eq!(tree["agent"]["max_iterations"].as_integer(), Some(5));
    }

    #[test]
    fn test_unparseable_number_stays_string() {
        let val = coerce_to_toml_value("server.port", "not-a-port");
        assert_eq!(val.as_str(), Some("not-a-port"));
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(
            coerce_to_toml_value("server.cors", "false").as_bool(),
            Some(false)
        );
    }
}
