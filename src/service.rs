//! Ingest and query operations shared by every transport
//!
//! `ReadingService` ties the classifier, the store and the broadcaster
//! together. The HTTP layer only translates requests and responses.
//!
//! ## Ordering
//!
//! An ingest appends and then publishes while holding the ingest gate. Two
//! concurrent ingests are therefore published in the order they were
//! persisted, and a live observer never sees a reading that `latest` would
//! not return.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};

use crate::{
    Reading, SensorPayload,
    actors::broadcaster::BroadcasterHandle,
    classifier::Classification,
    storage::{NewReading, ReadingStore, StorageError},
};

/// Number of readings returned by `latest_readings` when the caller gives none
pub const DEFAULT_LATEST_COUNT: usize = 5;

/// Error label reported to callers when the store fails
pub const STORAGE_ERROR: &str = "storage";

/// Reply to an ingest request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestResponse {
    pub fn accepted(alert: bool) -> Self {
        Self {
            success: true,
            alert: Some(alert),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            alert: None,
            error: Some(reason.into()),
        }
    }
}

/// Reply to a latest-readings query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestResponse {
    pub success: bool,

    /// Newest first; absent when the query failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Reading>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LatestResponse {
    pub fn found(data: Vec<Reading>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(reason.into()),
        }
    }
}

/// Classify, persist, publish
pub struct ReadingService {
    store: Arc<dyn ReadingStore>,
    broadcaster: BroadcasterHandle,
    gate: Arc<Mutex<()>>,
}

impl ReadingService {
    pub fn new(store: Arc<dyn ReadingStore>, broadcaster: BroadcasterHandle) -> Self {
        Self {
            store,
            broadcaster,
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &Arc<dyn ReadingStore> {
        &self.store
    }

    pub fn broadcaster(&self) -> &BroadcasterHandle {
        &self.broadcaster
    }

    /// Accept one device payload
    ///
    /// On success the persisted reading has been handed to every live
    /// subscriber and the reply carries the alert signal. When the store
    /// fails nothing is published and the reply is `{success: false,
    /// error: "storage"}`.
    ///
    /// Append and publish run on their own task, so dropping the returned
    /// future never leaves a stored reading unpublished.
    #[instrument(skip(self))]
    pub async fn ingest(&self, payload: SensorPayload) -> IngestResponse {
        let classification = Classification::of(&payload);
        let row = NewReading::classified(&payload, &classification);

        let store = self.store.clone();
        let broadcaster = self.broadcaster.clone();
        let gate = self.gate.clone();

        let persisted = tokio::spawn(async move {
            let _gate = gate.lock().await;

            let reading = store.append(row).await?;
            let delivered = broadcaster.publish(reading.clone()).await;
            Ok::<_, StorageError>((reading, delivered))
        });

        match persisted.await {
            Ok(Ok((reading, delivered))) => {
                debug!(
                    "ingested reading #{} (alert: {}), pushed to {delivered} observers",
                    reading.id, classification.alert
                );
                IngestResponse::accepted(classification.alert)
            }
            Ok(Err(e)) => {
                error!("failed to persist reading: {}", e);
                IngestResponse::failed(STORAGE_ERROR)
            }
            Err(e) => {
                error!("ingest task failed: {}", e);
                IngestResponse::failed(STORAGE_ERROR)
            }
        }
    }

    /// The `count` most recent readings, newest first
    #[instrument(skip(self))]
    pub async fn latest_readings(&self, count: usize) -> LatestResponse {
        match self.store.latest(count).await {
            Ok(readings) => LatestResponse::found(readings),
            Err(e) => {
                warn!("failed to query latest readings: {}", e);
                LatestResponse::failed(STORAGE_ERROR)
            }
        }
    }
}
