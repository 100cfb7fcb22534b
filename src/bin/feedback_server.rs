//! # Feedback Server
//!
//! Standalone binary serving the feedback REST API and running workflow
//! instances in-process.
//!
//! ## Usage
//!
//! ```bash
//! # Run with configuration from ./config
//! cargo run --bin feedback-server
//!
//! # Run with a specific environment and bind address
//! FEEDBACK_ENV=production cargo run --bin feedback-server -- --bind 0.0.0.0:9000
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

use feedback_core::bootstrap::FeedbackSystem;
use feedback_core::config::ConfigManager;
use feedback_core::logging;

#[derive(Debug, Parser)]
#[command(name = "feedback-server", version, about = "Feedback collection and analysis service")]
struct Cli {
    /// Directory holding feedback.toml and per-environment overrides
    #[arg(long, env = "FEEDBACK_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Environment name; defaults to FEEDBACK_ENV or development
    #[arg(long)]
    environment: Option<String>,

    /// Override web.bind_address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_structured_logging();
    let cli = Cli::parse();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting feedback server");

    let environment = cli
        .environment
        .unwrap_or_else(ConfigManager::detect_environment);
    let manager =
        ConfigManager::load_from_directory_with_env(Some(cli.config_dir), &environment)
            .context("failed to load configuration")?;

    let mut config = manager.config().clone();
    if let Some(bind) = cli.bind {
        config.web.bind_address = bind;
    }
    let bind_address = config.web.bind_address.clone();

    let system = FeedbackSystem::bootstrap(config)
        .await
        .context("failed to bootstrap feedback system")?;

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!(address = %bind_address, environment = %environment, "Web API listening");

    axum::serve(listener, system.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("web server terminated")?;

    info!("Shutdown signal received, draining workflow instances");
    system.shutdown().await;
    info!("Feedback server shutdown complete");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(error = %error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
