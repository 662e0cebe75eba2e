//! Binwatch CLI
//!
//! Command-line interface for the bin monitoring admin API.

use std::path::PathBuf;

use binwatch::{load_config, Config};
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(name = "binwatch")]
#[command(about = "Admin API for air-quality monitored bins")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(long)]
    database_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, database_url={:?}, log_level={:?}",
        args.config,
        args.port,
        args.database_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    tracing::info!("Starting binwatch service");
    binwatch::run(config).await?;

    Ok(())
}
