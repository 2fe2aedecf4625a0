use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

use crate::actors::broadcaster::DEFAULT_SUBSCRIBER_BUFFER;

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    Memory,

    /// SQLite database (default)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "crate::util::get_db_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: crate::util::get_db_path(),
        }
    }
}

/// Hub configuration
///
/// Every field is optional in the file. Missing values fall back to the
/// `SENSOR_HUB_*` / `SENSOR_DB_PATH` environment variables and then to
/// built-in defaults.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default = "crate::util::get_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Capacity of each live subscriber's channel
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            bind_addr: crate::util::get_bind_addr(),
            subscriber_buffer: default_subscriber_buffer(),
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_subscriber_buffer() -> usize {
    DEFAULT_SUBSCRIBER_BUFFER
}

fn default_enable_cors() -> bool {
    true
}

/// Device agent configuration
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Base URL of the hub, e.g. `http://127.0.0.1:8080`
    pub hub_url: String,

    /// Time between two automatic sends
    pub interval: Duration,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hub_url: crate::util::get_hub_url(),
            interval: Duration::from_secs(default_interval()),
            timeout: Duration::from_secs(10),
        }
    }
}

fn default_interval() -> u64 {
    2
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
