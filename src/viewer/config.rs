//! Configuration for the observer dashboard

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::views::DEFAULT_HISTORY_SIZE;

/// Viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Hub URL
    pub api_url: String,

    /// Rows kept in the recent-history ring (default: 5)
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Readings requested to seed the time series (default: 5)
    #[serde(default = "default_series_seed")]
    pub series_seed: usize,

    /// Timeout for snapshot requests in seconds (default: 10)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Log at debug level instead of info (default: false)
    #[serde(default)]
    pub debug: bool,
}

fn default_history_size() -> usize {
    DEFAULT_HISTORY_SIZE
}

fn default_series_seed() -> usize {
    5
}

fn default_request_timeout() -> u64 {
    10
}

impl Config {
    /// Most verbose level written to the viewer log
    pub fn log_level(&self) -> tracing::Level {
        if self.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            // Try default location
            let home = dirs::home_dir()?;
            let default_path = home.join(".config/sensor-relay/viewer.toml");
            if default_path.exists() {
                Some(default_path)
            } else {
                None
            }
        });

        if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: crate::util::get_hub_url(),
            history_size: default_history_size(),
            series_seed: default_series_seed(),
            request_timeout: default_request_timeout(),
            debug: false,
        }
    }
}
