//! Configuration for dashboard clients

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the dashboard server, e.g. `http://127.0.0.1:5000`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Join an absolute path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.base_url.is_empty() {
            return Err(crate::AppError::Config("base_url must not be empty".into()));
        }
        if self.poll_interval_seconds == 0 {
            return Err(crate::AppError::Config(
                "poll_interval_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<ClientConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: ClientConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ClientConfig {
            base_url: "http://greenhouse.local:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint("/alerts"),
            "http://greenhouse.local:8080/alerts"
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = ClientConfig {
            poll_interval_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/client.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(
            &path,
            r#"{"base_url": "http://10.0.0.5:5000", "poll_interval_seconds": 15}"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:5000");
        assert_eq!(config.poll_interval_seconds, 15);
    }

    #[test]
    fn load_config_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_config(&path).is_err());
    }
}
