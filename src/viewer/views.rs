//! Derived views of the live reading stream
//!
//! Every view is a plain value folded over [`LiveMessage`]s with `reduce`.
//! The ring and the series can additionally be seeded from a one-shot
//! snapshot of the most recent readings; the seed may land before or after
//! live messages and the result is the same either way.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{DistanceStatus, Reading, ReadingId, TemperatureStatus};

use super::client::SnapshotError;
use super::session::LiveMessage;

/// Default capacity of the recent-history ring
pub const DEFAULT_HISTORY_SIZE: usize = 5;

/// Progress of a view's one-shot snapshot
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SeedState {
    #[default]
    Pending,
    Loaded,
    Failed(String),
}

impl SeedState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SeedState::Pending)
    }
}

impl From<&SnapshotError> for SeedState {
    fn from(err: &SnapshotError) -> Self {
        SeedState::Failed(err.to_string())
    }
}

/// Latest value and status of one metric kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gauge<S> {
    pub value: f64,
    pub status: Option<S>,
    pub updated_at: DateTime<Utc>,
}

/// Latest known value of each metric kind
///
/// A reading only updates the kinds it carries; the other kind keeps its
/// previous value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurrentMetrics {
    pub temperature: Option<Gauge<TemperatureStatus>>,
    pub distance: Option<Gauge<DistanceStatus>>,
}

impl CurrentMetrics {
    pub fn reduce(mut self, message: &LiveMessage) -> Self {
        let reading = &message.reading;

        if let Some(value) = reading.temperature {
            self.temperature = Some(Gauge {
                value,
                status: reading.temperature_status,
                updated_at: message.received_at,
            });
        }

        if let Some(value) = reading.distance {
            self.distance = Some(Gauge {
                value,
                status: reading.distance_status,
                updated_at: message.received_at,
            });
        }

        self
    }
}

/// The most recent readings, newest first, bounded to `capacity`
///
/// The visible entries are the live readings received so far merged with the
/// seed snapshot, de-duplicated by id, ordered by id (newest first) and
/// truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRing {
    capacity: usize,
    live: Vec<Reading>,
    seeded: Vec<Reading>,
    entries: Vec<Reading>,
    seed: SeedState,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            live: Vec::new(),
            seeded: Vec::new(),
            entries: Vec::new(),
            seed: SeedState::Pending,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[Reading] {
        &self.entries
    }

    pub fn seed_state(&self) -> &SeedState {
        &self.seed
    }

    pub fn reduce(mut self, message: &LiveMessage) -> Self {
        self.live.insert(0, message.reading.clone());
        self.live.truncate(self.capacity);
        self.rebuild();
        self
    }

    /// Apply the snapshot (newest first) or record why it failed
    ///
    /// Only the first seed is applied.
    pub fn seed(mut self, snapshot: Result<Vec<Reading>, SnapshotError>) -> Self {
        if !self.seed.is_pending() {
            return self;
        }

        match snapshot {
            Ok(readings) => {
                self.seeded = readings;
                self.seeded.truncate(self.capacity);
                self.seed = SeedState::Loaded;
                self.rebuild();
            }
            Err(e) => self.seed = SeedState::from(&e),
        }

        self
    }

    fn rebuild(&mut self) {
        let mut seen = HashSet::new();
        let mut entries: Vec<Reading> = self
            .live
            .iter()
            .chain(self.seeded.iter())
            .filter(|reading| seen.insert(reading.id))
            .cloned()
            .collect();

        // ids follow persistence order
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(self.capacity);
        self.entries = entries;
    }
}

/// One plotted sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// Unbounded per-kind sample series
///
/// Seeded points are stamped with the reading's `created_at`; live points
/// with the time the observer received them. Readings that arrive live
/// while the seed is still pending are not plotted a second time when the
/// seed lands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    temperature: Vec<Point>,
    distance: Vec<Point>,
    seen_live: HashSet<ReadingId>,
    seed: SeedState,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(&self) -> &[Point] {
        &self.temperature
    }

    pub fn distance(&self) -> &[Point] {
        &self.distance
    }

    pub fn seed_state(&self) -> &SeedState {
        &self.seed
    }

    pub fn reduce(mut self, message: &LiveMessage) -> Self {
        let reading = &message.reading;

        if self.seed.is_pending() {
            self.seen_live.insert(reading.id);
        }

        if let Some(value) = reading.temperature {
            self.temperature.push(Point {
                at: message.received_at,
                value,
            });
        }

        if let Some(value) = reading.distance {
            self.distance.push(Point {
                at: message.received_at,
                value,
            });
        }

        self
    }

    /// Apply the snapshot (newest first) or record why it failed
    ///
    /// Seed points are older than anything received live, so they go in
    /// front of the live points, oldest first.
    pub fn seed(mut self, snapshot: Result<Vec<Reading>, SnapshotError>) -> Self {
        if !self.seed.is_pending() {
            return self;
        }

        match snapshot {
            Ok(readings) => {
                let fresh: Vec<_> = readings
                    .iter()
                    .rev()
                    .filter(|reading| !self.seen_live.contains(&reading.id))
                    .collect();

                let mut temperature: Vec<_> = fresh
                    .iter()
                    .filter_map(|r| r.temperature.map(|value| Point { at: r.created_at, value }))
                    .collect();
                temperature.append(&mut self.temperature);
                self.temperature = temperature;

                let mut distance: Vec<_> = fresh
                    .iter()
                    .filter_map(|r| r.distance.map(|value| Point { at: r.created_at, value }))
                    .collect();
                distance.append(&mut self.distance);
                self.distance = distance;

                self.seed = SeedState::Loaded;
            }
            Err(e) => self.seed = SeedState::from(&e),
        }

        self.seen_live.clear();
        self
    }
}
