//! Configuration aggregator.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐
//!   │ FileProvider │──── runs first, in the caller's task ───┐
//!   └──────────────┘                                         │
//!   ┌──────────────┐                                         ▼
//!   │ RestProvider │── pool task ──▶ ring ──▶ ┌───────────────────────┐    ┌──────────────────────┐
//!   └──────────────┘                          │ shared mpsc<Message>  │───▶│ ConfigurationWatcher │
//!   ┌──────────────┐                          └───────────────────────┘    │ (latest per provider)│
//!   │ HttpProvider │── pool task ──────────────────────▲                   └──────────────────────┘
//!   └──────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;

use config_aggregator::config::loader::load_config;
use config_aggregator::config::{ConfigurationWatcher, StaticConfig};
use config_aggregator::lifecycle::{signals, startup, Pool};
use config_aggregator::observability::{logging, metrics};
use config_aggregator::provider::Provider;

#[derive(Parser)]
#[command(name = "config-aggregator")]
#[command(about = "Collects dynamic configuration from every provider", long_about = None)]
struct Cli {
    /// Static configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => StaticConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("config-aggregator v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let aggregator = startup::register_providers(&config.providers);
    if aggregator.is_empty() {
        tracing::warn!("No provider registered, nothing will be configured");
    }

    let pool = Pool::new();
    let (tx, rx) = mpsc::channel(config.providers.channel_capacity);

    let watcher = ConfigurationWatcher::new();
    let consumer = watcher.clone();
    pool.go_ctx(move |stop| async move { consumer.run(rx, stop).await });

    aggregator.provide(tx, pool.clone()).await?;
    tracing::info!(providers = ?aggregator.provider_names(), "Providers launched");

    let signal = signals::wait_for_signal().await;
    tracing::info!(signal, "Shutdown signal received");

    pool.stop().await;

    tracing::info!(providers = watcher.snapshot().len(), "Shutdown complete");
    Ok(())
}
