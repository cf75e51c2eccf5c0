//! `kgchatd` - knowledge-graph chat daemon.
//!
//! Loads configuration, starts backend initialization in the background and
//! serves the HTTP API until SIGINT or SIGTERM. In-flight requests get
//! `server.shutdown_grace_secs` to finish before they are abandoned.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kgchat_config::Config;
use kgchat_server::{
    AppState, build_backend, log_config, router, serve_with_grace, shutdown_signal,
    spawn_initialization,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Knowledge-graph chat daemon.
#[derive(Parser)]
#[command(name = "kgchatd")]
#[command(author, version, about = "Chat with a local model grounded in a knowledge graph")]
struct Args {
    /// Configuration file layered over the built-in defaults.
    #[arg(short, long, env = "KGCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let log = log_config(&config.logging, args.log_level.as_deref());
    if let Err(e) = kgchat_telemetry::setup_logging(&log) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let grace = config.server.shutdown_grace();
    let outcome = runtime.block_on(serve(config));

    // Agent runs hold blocking threads; dropping the runtime would wait on them.
    runtime.shutdown_timeout(grace);
    info!("Server stopped");
    outcome
}

async fn serve(config: Config) -> Result<()> {
    let backend = build_backend(&config);
    info!(model = %config.model.alias, "Starting backend initialization");
    let init = spawn_initialization(Arc::clone(&backend));

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running on http://localhost:{}", config.server.port);

    let (signalled_tx, signalled) = watch::channel(false);
    let signal = async move {
        shutdown_signal().await;
        signalled_tx.send_replace(true);
    };

    let app = router(AppState::new(backend), config.server.cors);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .into_future();

    let grace = config.server.shutdown_grace();
    if let Some(served) = serve_with_grace(server, signalled, grace).await {
        served.context("Server error")?;
    }

    if !init.is_finished() {
        warn!("Shutting down while initialization is still running");
        init.abort();
    }
    Ok(())
}
