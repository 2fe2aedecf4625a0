//! Shared API request and response types
//!
//! Ingest and query replies live next to the operations that produce them
//! (`crate::service`) and are re-exported here so that the hub and the viewer
//! deserialize exactly what the handlers serialize.

use serde::{Deserialize, Serialize};

use crate::actors::messages::BroadcastStats;

pub use crate::service::{IngestResponse, LatestResponse};

/// Query string of `GET /data/latest`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestQuery {
    /// How many readings to return
    pub count: Option<usize>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,

    /// Store health message
    pub storage: String,
}

/// Hub statistics response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub timestamp: String,

    /// Human-readable store summary, e.g. "SQLite: 12 readings"
    pub storage: String,

    pub broadcaster: BroadcastStats,
}
