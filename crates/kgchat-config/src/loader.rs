//! Layered loading.
//!
//! 1. Parse the embedded `defaults.toml`
//! 2. Deep-merge the user file, if one was given
//! 3. Apply env var fallbacks for fields the file left unset
//! 4. Deserialize the merged tree into [`Config`]
//! 5. Validate

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Load configuration using the process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or if the
/// merged configuration fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<Config> {
    load_with_env(path, &collect_env_vars())
}

/// Load configuration against an explicit environment map.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    path: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut file_fields = BTreeSet::new();
    if let Some(path) = path {
        let overlay = read_file(path)?;
        deep_merge_tracking(&mut merged, &overlay, "", &mut file_fields);
        info!(path = %path.display(), fields = file_fields.len(), "loaded config file");
    }

    let env_count = apply_env_fallbacks(&mut merged, &file_fields, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

fn read_file(path: &Path) -> ConfigResult<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Deep-merge `overlay` into `base`, recording every leaf path the overlay
/// set. Tables merge per field; scalars and arrays replace.
fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    set_fields: &mut BTreeSet<String>,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };

                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge_tracking(base_val, overlay_val, &path, set_fields);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, set_fields);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            set_fields.insert(prefix.to_owned());
        },
    }
}

fn record_leaves(val: &toml::Value, prefix: &str, set_fields: &mut BTreeSet<String>) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &format!("{prefix}.{key}"), set_fields);
        }
    } else {
        set_fields.insert(prefix.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_only() {
        let config = load_with_env(None, &no_env()).unwrap();
        assert_eq!(config.server.port, 3002);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.shutdown_grace(), std::time::Duration::from_secs(2));
        assert_eq!(config.model.alias, "phi-3.5-mini");
        assert!(config.model.temperature.abs() < f64::EPSILON);
        assert_eq!(config.mcp.endpoint, "http://localhost:3000/mcp");
        assert_eq!(config.mcp.graph_tool, "read_graph");
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.max_execution_secs, 30);
        assert!(config.agent.handle_parsing_errors);
        assert!(!config.agent.handle_tool_errors);
        assert!(config.model.service_url.is_none());
    }

    #[test]
    fn test_embedded_defaults_match_default_impl() {
        let loaded = load_with_env(None, &no_env()).unwrap();
        let built = Config::default();
        assert_eq!(
            toml::to_string(&loaded).unwrap(),
            toml::to_string(&built).unwrap()
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_config(
            r#"
            [server]
            port = 4100

            [agent]
            max_iterations = 6
            "#,
        );

        let config = load_with_env(Some(file.path()), &no_env()).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.agent.max_iterations, 6);
        // untouched sibling keeps its default
        assert_eq!(config.agent.max_execution_secs, 30);
    }

    #[test]
    fn test_env_is_fallback_not_override() {
        let file = write_config("[server]\nport = 4100\n");
        let env: HashMap<String, String> = [
            ("KGCHAT_PORT".to_owned(), "5000".to_owned()),
            ("KGCHAT_MCP_ENDPOINT".to_owned(), "http://graph:9000/mcp".to_owned()),
        ]
        .into();

        let config = load_with_env(Some(file.path()), &env).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.mcp.endpoint, "http://graph:9000/mcp");
    }

    #[test]
    fn test_env_sets_optional_fields() {
        let env: HashMap<String, String> = [
            ("KGCHAT_FOUNDRY_URL".to_owned(), "http://127.0.0.1:5273".to_owned()),
            ("OPENAI_API_KEY".to_owned(), "sk-local".to_owned()),
        ]
        .into();

        let config = load_with_env(None, &env).unwrap();
        assert_eq!(config.model.service_url.as_deref(), Some("http://127.0.0.1:5273"));
        assert_eq!(config.model.api_key.as_deref(), Some("sk-local"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_with_env(Some(&dir.path().join("absent.toml")), &no_env());
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let file = write_config("[server\nport = ");
        let result = load_with_env(Some(file.path()), &no_env());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_invalid_value_fails_validation() {
        let file = write_config("[agent]\nmax_iterations = 0\n");
        let result = load_with_env(Some(file.path()), &no_env());
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. }) if field == "agent.max_iterations"
        ));
    }

    #[test]
    fn test_merge_tracking_records_new_subtree() {
        let mut base: toml::Value = toml::from_str("[a]\nx = 1\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 2\n[b]\nz = 3\n").unwrap();
        let mut fields = BTreeSet::new();

        deep_merge_tracking(&mut base, &overlay, "", &mut fields);

        assert_eq!(base["a"]["x"].as_integer(), Some(1));
        assert!(fields.contains("a.y"));
        assert!(fields.contains("b.z"));
        assert!(!fields.contains("a.x"));
    }
}
