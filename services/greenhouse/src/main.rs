//! Greenhouse CLI
//!
//! Command-line interface for the greenhouse sensor dashboard server.

use std::path::PathBuf;

use clap::Parser;
use greenhouse::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "greenhouse")]
#[command(about = "Greenhouse sensor dashboard server")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file (overrides config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Record simulated readings (overrides config file)
    #[arg(long)]
    simulate: bool,

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
        "Parsed command line arguments: config={:?}, port={:?}, database={:?}, simulate={}, log_level={:?}",
        args.config,
        args.port,
        args.database,
        args.simulate,
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
    if let Some(database) = args.database {
        config.database.path = database;
    }
    if args.simulate {
        config.simulator.enabled = true;
    }

    tracing::info!("Starting greenhouse server");
    greenhouse::run(config).await?;

    Ok(())
}
