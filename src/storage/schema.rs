//! Reading rows as they go into the store
//!
//! The store owns two fields of every reading: the `id` and the final
//! `created_at`. Everything else is decided by the ingest path before
//! `append` is called and is stored verbatim.

use chrono::{DateTime, Utc};

use crate::{
    DistanceStatus, Reading, ReadingId, SensorPayload, TemperatureStatus,
    classifier::Classification,
};

/// A classified reading that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub temperature: Option<f64>,
    pub distance: Option<f64>,
    pub temperature_status: Option<TemperatureStatus>,
    pub distance_status: Option<DistanceStatus>,

    /// Requested write time; the store assigns one when absent
    pub created_at: Option<DateTime<Utc>>,
}

impl NewReading {
    pub fn classified(payload: &SensorPayload, classification: &Classification) -> Self {
        Self {
            temperature: payload.temperature,
            distance: payload.distance,
            temperature_status: classification.temperature_status,
            distance_status: classification.distance_status,
            created_at: None,
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Attach the store-assigned identity
    pub fn into_reading(self, id: ReadingId, created_at: DateTime<Utc>) -> Reading {
        Reading {
            id,
            temperature: self.temperature,
            distance: self.distance,
            temperature_status: self.temperature_status,
            distance_status: self.distance_status,
            created_at,
        }
    }
}

/// Pick the `created_at` for the next appended reading
///
/// The result has millisecond precision (what the SQLite column holds) and is
/// never earlier than `previous`, which keeps the insertion order and the
/// timestamp order in agreement even when the wall clock steps backwards.
pub fn next_created_at(
    requested: Option<DateTime<Utc>>,
    previous: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    let requested = truncate_to_millis(requested.unwrap_or_else(Utc::now));

    match previous {
        Some(previous) if previous > requested => previous,
        _ => requested,
    }
}

pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(dt)
}
