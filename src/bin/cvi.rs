//! CVI batch runner
//!
//! Runs one batch over the configured assets and exits. Scheduling is left to
//! cron or a CI workflow.
//!
//! Usage:
//!   cvi --config config/cvi.yaml --assets BTC,ETH

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use cvi_engine::config::{init_logging, load_config, load_default_config, select_assets};
use cvi_engine::data::LiveGateway;
use cvi_engine::pipeline::Engine;

#[derive(Parser, Debug)]
#[command(name = "cvi")]
#[command(about = "Crypto volatility index batch run")]
struct Args {
    /// YAML configuration file; defaults plus environment overrides when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated symbols, overrides the configured asset list
    #[arg(long)]
    assets: Option<String>,

    /// Output directory, overrides the configured one
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before logging so LOG_FORMAT / RUST_LOG from .env apply
    dotenvy::dotenv().ok();
    init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path),
        None => load_default_config(),
    }
    .context("Failed to load configuration")?;

    if let Some(list) = &args.assets {
        config.assets = select_assets(&config.assets, list);
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let gateway = LiveGateway::new(&config.gateway, &config.retry)
        .context("Failed to build HTTP gateway")?;
    let engine = Engine::new(Arc::new(gateway), config).context("Invalid configuration")?;

    let report = engine.run_batch(Utc::now()).await;

    for asset in &report.assets {
        let latest_iv = asset.latest.as_ref().and_then(|p| p.iv());
        tracing::info!(
            symbol = %asset.symbol,
            healthy = asset.healthy,
            spot = ?asset.spot.map(|s| s.value),
            iv = ?latest_iv,
            iv_source = ?asset.iv_source,
            points = asset.points,
            recommendation = ?asset.recommendation,
            orders = asset.orders,
            "Summary"
        );
    }

    Ok(())
}
