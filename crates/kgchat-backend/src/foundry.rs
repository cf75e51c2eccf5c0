//! Foundry Local runtime manager.
//!
//! The service is discovered through the `foundry` CLI (`foundry service
//! status` prints the URL it listens on) unless a service URL is configured,
//! in which case the CLI is never invoked. Model catalog and loading go
//! through the service's REST API.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{RuntimeError, RuntimeResult};
use crate::runtime::{ModelEndpoint, ModelRuntime};

/// Key used when neither configuration nor environment supplies one.
/// Foundry Local does not check it.
pub const PLACEHOLDER_API_KEY: &str = "OPENAI_API_KEY";

const START_POLL_INTERVAL: Duration = Duration::from_millis(500);
const START_POLL_ATTEMPTS: u32 = 20;

/// [`ModelRuntime`] backed by a Foundry Local installation.
#[derive(Debug)]
pub struct FoundryLocalRuntime {
    binary: String,
    configured_url: Option<String>,
    discovered_url: OnceCell<String>,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    #[serde(default)]
    alias: String,
}

impl FoundryLocalRuntime {
    /// Create a manager that drives the CLI found as `binary`.
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            configured_url: None,
            discovered_url: OnceCell::new(),
            api_key: None,
            client: Client::new(),
        }
    }

    /// Use a fixed service URL instead of asking the CLI.
    #[must_use]
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.configured_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Key reported for loaded models. Falls back to [`PLACEHOLDER_API_KEY`].
    #[must_use]
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    fn resolve_binary(&self) -> RuntimeResult<PathBuf> {
        which::which(&self.binary).map_err(|e| RuntimeError::BinaryNotFound {
            binary: self.binary.clone(),
            reason: e.to_string(),
        })
    }

    async fn run_cli(&self, args: &[&str]) -> RuntimeResult<String> {
        let binary = self.resolve_binary()?;
        let command = format!("{} {}", self.binary, args.join(" "));
        debug!(command = %command, "Running runtime CLI");

        let output = Command::new(binary)
            .args(args)
            .output()
            .await
            .map_err(|e| RuntimeError::CommandFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(RuntimeError::CommandFailed {
                command,
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Ask the CLI where the service listens, if it is running.
    async fn probe_cli(&self) -> RuntimeResult<Option<String>> {
        let status = self.run_cli(&["service", "status"]).await?;
        Ok(parse_service_url(&status))
    }

    async fn service_url(&self) -> RuntimeResult<String> {
        if let Some(url) = &self.configured_url {
            return Ok(url.clone());
        }
        self.discovered_url
            .get_or_try_init(|| async {
                self.probe_cli().await?.ok_or_else(|| {
                    RuntimeError::ServiceUnavailable("service is not running".to_string())
                })
            })
            .await
            .cloned()
    }

    async fn resolve_model_id(&self, alias: &str) -> RuntimeResult<String> {
        let url = format!("{}/foundry/list", self.service_url().await?);
        let catalog: Vec<CatalogEntry> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        select_model(&catalog, alias).ok_or_else(|| RuntimeError::ModelNotFound {
            alias: alias.to_string(),
        })
    }
}

#[async_trait]
impl ModelRuntime for FoundryLocalRuntime {
    async fn is_service_running(&self) -> RuntimeResult<bool> {
        if let Some(url) = &self.configured_url {
            let status = format!("{url}/openai/status");
            return Ok(self
                .client
                .get(&status)
                .send()
                .await
                .is_ok_and(|r| r.status().is_success()));
        }

        match self.probe_cli().await? {
            Some(url) => {
                let _ = self.discovered_url.set(url);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn start_service(&self) -> RuntimeResult<()> {
        if self.configured_url.is_some() {
            return Err(RuntimeError::ServiceUnavailable(
                "configured service URL is not answering".to_string(),
            ));
        }

        info!(binary = %self.binary, "Starting Foundry Local service");
        self.run_cli(&["service", "start"]).await?;

        for _ in 0..START_POLL_ATTEMPTS {
            if let Some(url) = self.probe_cli().await? {
                info!(url = %url, "Foundry Local service started");
                let _ = self.discovered_url.set(url);
                return Ok(());
            }
            tokio::time::sleep(START_POLL_INTERVAL).await;
        }

        Err(RuntimeError::ServiceUnavailable(
            "service did not report a URL after starting".to_string(),
        ))
    }

    async fn load_model(&self, alias: &str) -> RuntimeResult<()> {
        let id = self.resolve_model_id(alias).await?;
        let url = format!("{}/openai/load/{id}", self.service_url().await?);
        info!(alias, model = %id, "Loading model");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RuntimeError::LoadFailed {
                model: id,
                reason: format!("HTTP {status}: {body}"),
            });
        }
        Ok(())
    }

    async fn model_info(&self, alias: &str) -> RuntimeResult<ModelEndpoint> {
        let id = self.resolve_model_id(alias).await?;
        let api_key = self
            .api_key
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string());

        Ok(ModelEndpoint {
            id,
            endpoint: format!("{}/v1", self.service_url().await?),
            api_key,
        })
    }
}

/// Extract the service origin from `foundry service status` output.
fn parse_service_url(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .filter(|word| word.starts_with("http://") || word.starts_with("https://"))
        .find_map(|word| Url::parse(word.trim_end_matches(['.', ','])).ok())
        .map(|url| url.origin().ascii_serialization())
}

/// Pick the catalog entry for `alias`: an exact id match wins, otherwise the
/// first variant carrying the alias.
fn select_model(catalog: &[CatalogEntry], alias: &str) -> Option<String> {
    catalog
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(alias))
        .or_else(|| {
            catalog
                .iter()
                .find(|entry| entry.alias.eq_ignore_ascii_case(alias))
        })
        .map(|entry| entry.name.clone())
}
