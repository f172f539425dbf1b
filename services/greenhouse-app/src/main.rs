//! greenhouse-watch CLI
//!
//! Follows a running dashboard server from the terminal: prints the latest
//! readings and the active alerts every poll period.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use greenhouse_app::io::ReqwestHttpClient;
use greenhouse_app::render::{AlertItem, AlertListView, LatestColumn, LatestReadingsView};
use greenhouse_app::{load_config, ClientConfig, LiveUpdates};
use tokio::sync::Mutex;
use tracing::Level;

#[derive(Parser)]
#[command(name = "greenhouse-watch")]
#[command(about = "Follow greenhouse sensor readings and alerts from the terminal")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard server URL (overrides config file)
    #[arg(short, long)]
    url: Option<String>,

    /// Poll interval in seconds (overrides config file)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

/// Prints each row once its last column arrives
#[derive(Default)]
struct TerminalTable {
    row: Vec<(LatestColumn, String)>,
}

impl LatestReadingsView for TerminalTable {
    fn set_cell(&mut self, column: LatestColumn, text: &str) {
        self.row.push((column, text.to_string()));
        if column == LatestColumn::Timestamp {
            println!("Latest readings");
            for (column, text) in self.row.drain(..) {
                println!("  {:<16} {}", column.heading(), text);
            }
        }
    }
}

struct TerminalAlerts;

impl AlertListView for TerminalAlerts {
    fn clear(&mut self) {
        println!("Active alerts");
    }

    fn append_item(&mut self, item: &AlertItem) {
        println!("  - {}", item);
    }

    fn show_message(&mut self, message: &str) {
        println!("  {}", message);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        ClientConfig::default()
    };

    if let Some(url) = args.url {
        config.base_url = url;
    }
    if let Some(interval) = args.interval {
        config.poll_interval_seconds = interval;
    }

    let updates = LiveUpdates::start(
        Arc::new(ReqwestHttpClient::new()),
        &config,
        Arc::new(Mutex::new(TerminalTable::default())),
        Arc::new(Mutex::new(TerminalAlerts)),
    )?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    updates.stop().await;

    Ok(())
}
