//! In-memory storage backend (no persistence)
//!
//! Useful for:
//! - Testing without database dependencies
//! - Running the hub without a writable disk
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on restart
//! - **Unbounded**: Readings are never evicted

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::backend::{HealthStatus, ReadingStore};
use super::error::StorageResult;
use super::schema::{NewReading, next_created_at};
use crate::Reading;

/// In-memory storage backend
///
/// Readings are kept in insertion order. The write lock is held for the whole
/// of an append, so a concurrent `latest` sees either all of it or none of it.
#[derive(Default)]
pub struct MemoryBackend {
    readings: RwLock<Vec<Reading>>,
}

impl MemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingStore for MemoryBackend {
    async fn append(&self, reading: NewReading) -> StorageResult<Reading> {
        let mut readings = self.readings.write().await;

        let previous = readings.last().map(|r| r.created_at);
        let created_at = next_created_at(reading.created_at, previous);
        let id = readings.len() as i64 + 1;

        let reading = reading.into_reading(id, created_at);
        readings.push(reading.clone());

        trace!("in-memory backend: appended reading #{id}");
        Ok(reading)
    }

    async fn latest(&self, limit: usize) -> StorageResult<Vec<Reading>> {
        debug!("querying latest {} readings from memory", limit);

        let readings = self.readings.read().await;
        Ok(readings.iter().rev().take(limit).cloned().collect())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let count = self.readings.read().await.len();

        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("total_readings".to_string(), count.to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let count = self.readings.read().await.len();
        Ok(format!("In-Memory: {} readings", count))
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
