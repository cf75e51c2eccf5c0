//! Process-level wiring: backend construction, background initialization,
//! logging setup and shutdown signals.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use kgchat_backend::{BackendLifecycle, BackendSettings, FoundryLocalRuntime};
use kgchat_config::{Config, LoggingSection};
use kgchat_mcp::McpConnector;
use kgchat_telemetry::{FileRotation, LogConfig, LogFormat, LogTarget};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Build an idle backend lifecycle from configuration.
#[must_use]
pub fn build_backend(config: &Config) -> Arc<BackendLifecycle> {
    let mut runtime = FoundryLocalRuntime::new(config.model.foundry_bin.clone())
        .with_api_key(config.model.api_key.clone());
    if let Some(url) = &config.model.service_url {
        runtime = runtime.with_service_url(url.clone());
    }

    let connector = McpConnector::new(config.mcp.endpoint.clone());

    Arc::new(BackendLifecycle::new(
        Arc::new(runtime),
        Arc::new(connector),
        BackendSettings::from_config(config),
    ))
}

/// Start initialization on a background task.
///
/// A failure is logged and stays visible through the status snapshot; it is
/// never returned to an HTTP caller.
pub fn spawn_initialization(backend: Arc<BackendLifecycle>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = backend.initialize().await {
            error!(error = %e, "Failed to initialize AI on startup");
        }
    })
}

/// Translate the logging section into a telemetry config.
///
/// `level_override` replaces the configured level (e.g. from the command line).
#[must_use]
pub fn log_config(section: &LoggingSection, level_override: Option<&str>) -> LogConfig {
    let format = match section.format.as_str() {
        "pretty" => LogFormat::Pretty,
        "json" => LogFormat::Json,
        _ => LogFormat::Compact,
    };

    let mut config = LogConfig::new(level_override.unwrap_or(&section.level)).with_format(format);
    if let Some(dir) = &section.directory {
        let rotation = match section.rotation.as_str() {
            "hourly" => FileRotation::Hourly,
            "never" => FileRotation::Never,
            _ => FileRotation::Daily,
        };
        config = config.with_file_logging(dir.clone(), "kgchatd", rotation);
    } else {
        config = config.with_target(LogTarget::Stderr);
    }

    section
        .directives
        .iter()
        .fold(config, |config, directive| config.with_directive(directive.clone()))
}

/// Resolve once SIGINT or SIGTERM arrives.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Received shutdown signal, shutting down gracefully");
}

/// Drive `serve` to completion, but give up `grace` after `signalled` flips
/// to `true`.
///
/// Returns `None` when in-flight work was abandoned.
pub async fn serve_with_grace<F: Future>(
    serve: F,
    mut signalled: watch::Receiver<bool>,
    grace: Duration,
) -> Option<F::Output> {
    tokio::pin!(serve);

    let fired = tokio::select! {
        output = &mut serve => return Some(output),
        fired = signalled.wait_for(|fired| *fired) => fired.is_ok(),
    };
    if !fired {
        return Some(serve.await);
    }

    if let Ok(output) = tokio::time::timeout(grace, &mut serve).await {
        Some(output)
    } else {
        warn!(
            grace_ms = grace.as_millis(),
            "In-flight requests outlived the shutdown grace period; abandoning them"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_log_config_from_defaults() {
        let config = log_config(&LoggingSection::default(), None);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.target, LogTarget::Stderr);
    }

    #[test]
    fn test_log_config_override_and_file_target() {
        let section = LoggingSection {
            format: "json".to_owned(),
            directory: Some(PathBuf::from("/var/log/kgchat")),
            rotation: "hourly".to_owned(),
            directives: vec!["kgchat_mcp=debug".to_owned()],
            ..LoggingSection::default()
        };
        let config = log_config(&section, Some("trace"));

        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(
            config.target,
            LogTarget::File(PathBuf::from("/var/log/kgchat"))
        );
        assert_eq!(config.rotation, FileRotation::Hourly);
        assert_eq!(config.directives, vec!["kgchat_mcp=debug".to_owned()]);
    }

    #[tokio::test]
    async fn test_drain_is_cut_short_after_the_grace_period() {
        let (tx, rx) = watch::channel(false);
        tx.send_replace(true);
        let started = std::time::Instant::now();

        let output = serve_with_grace(
            std::future::pending::<()>(),
            rx,
            Duration::from_millis(50),
        )
        .await;

        assert!(output.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_drain_that_finishes_in_time_keeps_its_output() {
        let (tx, rx) = watch::channel(false);
        let serve = async move {
            tx.send_replace(true);
            tokio::time::sleep(Duration::from_millis(10)).await;
            "drained"
        };

        let output = serve_with_grace(serve, rx, Duration::from_secs(5)).await;
        assert_eq!(output, Some("drained"));
    }

    #[tokio::test]
    async fn test_serve_without_signal_runs_to_completion() {
        let (tx, rx) = watch::channel(false);
        let output = serve_with_grace(async { 7_u8 }, rx, Duration::ZERO).await;
        assert_eq!(output, Some(7));
        drop(tx);
    }

    #[tokio::test]
    async fn test_backend_starts_idle() {
        let backend = build_backend(&Config::default());
        let status = backend.status();
        assert!(!status.is_initialized);
        assert!(!status.is_initializing);
    }
}
