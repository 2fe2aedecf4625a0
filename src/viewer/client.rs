//! HTTP client for the one-shot "latest readings" snapshot

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{Reading, service::LatestResponse};

/// Why a snapshot could not be loaded
///
/// Both variants are distinct from a successful but empty snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// Request failed or the reply could not be decoded
    Transport(String),

    /// The hub answered `{success: false}`
    Rejected(Option<String>),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Transport(msg) => write!(f, "snapshot request failed: {}", msg),
            SnapshotError::Rejected(Some(reason)) => write!(f, "hub rejected snapshot: {}", reason),
            SnapshotError::Rejected(None) => write!(f, "hub rejected snapshot"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<reqwest::Error> for SnapshotError {
    fn from(err: reqwest::Error) -> Self {
        SnapshotError::Transport(err.to_string())
    }
}

/// Fetches `GET /data/latest` from the hub
#[derive(Clone)]
pub struct SnapshotClient {
    api_url: String,

    /// Reusable HTTP client for API requests
    http_client: reqwest::Client,
}

impl SnapshotClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// The `count` most recent readings, newest first
    pub async fn latest(&self, count: usize) -> Result<Vec<Reading>, SnapshotError> {
        let url = format!("{}/data/latest?count={count}", self.api_url);
        debug!("fetching snapshot from {url}");

        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        let body: LatestResponse = response.json().await.map_err(|e| {
            SnapshotError::Transport(format!("unexpected reply (HTTP {status}): {e}"))
        })?;

        if !body.success {
            warn!("snapshot rejected by hub: {:?}", body.error);
            return Err(SnapshotError::Rejected(body.error));
        }

        Ok(body.data.unwrap_or_default())
    }
}
