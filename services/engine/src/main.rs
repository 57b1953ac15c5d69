//! Trading engine binary
//!
//! `trading_engine [config_path]` — exits 0 on clean shutdown, non-zero
//! when initialization or startup fails.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trading_engine::{EngineConfig, TradingEngine};

#[derive(Debug, Parser)]
#[command(name = "trading_engine", about = "Exchange-style trading engine")]
struct Args {
    /// Path to the engine configuration file.
    #[arg(default_value = "config/trading_engine.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = EngineConfig::load_from_file(&args.config)
        .with_context(|| format!("load configuration from {}", args.config.display()))?;

    let engine = TradingEngine::new(config).context("initialize trading engine")?;
    engine.start().await.context("start trading engine")?;
    info!("trading engine running, Ctrl+C to stop");

    shutdown_signal().await;
    engine.stop().await;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("received Ctrl+C, shutting down");
    }
}
