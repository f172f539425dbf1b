//! Configuration types and parsing for the greenhouse server

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file; created on first start
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            pool_size: default_pool_size(),
        }
    }
}

/// Synthetic readings for running without hardware
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_simulator_interval")]
    pub interval_seconds: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: default_simulator_interval(),
        }
    }
}

impl SimulatorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Range of the history page when no dates are given
    #[serde(default = "default_history_days")]
    pub history_days: u64,
    /// Refresh period of the live panels on the dashboard page
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history_days: default_history_days(),
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> crate::Result<()> {
        if self.database.pool_size == 0 {
            return Err(crate::GreenhouseError::Config(
                "database.pool_size must be at least 1".into(),
            ));
        }
        if self.simulator.interval_seconds == 0 {
            return Err(crate::GreenhouseError::Config(
                "simulator.interval_seconds must be at least 1".into(),
            ));
        }
        if self.dashboard.history_days == 0 {
            return Err(crate::GreenhouseError::Config(
                "dashboard.history_days must be at least 1".into(),
            ));
        }
        if self.dashboard.poll_interval_seconds == 0 {
            return Err(crate::GreenhouseError::Config(
                "dashboard.poll_interval_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("greenhouse.db")
}

fn default_pool_size() -> u32 {
    5
}

fn default_simulator_interval() -> u64 {
    60
}

fn default_history_days() -> u64 {
    7
}

fn default_poll_interval() -> u64 {
    60
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::GreenhouseError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
