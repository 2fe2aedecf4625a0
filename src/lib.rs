pub mod actors;
pub mod classifier;
pub mod config;
pub mod service;
pub mod storage;
pub mod util;

#[cfg(feature = "api")]
pub mod api;

#[cfg(feature = "dashboard")]
pub mod viewer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the store when a reading is persisted
pub type ReadingId = i64;

/// Inbound device payload
///
/// Both fields are optional; a payload with neither is still accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureStatus {
    Cold,
    Hot,
    VeryHot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceStatus {
    Far,
    Near,
    VeryNear,
}

/// A classified, persisted sensor sample
///
/// This is both the row returned by the store and the message pushed to
/// live observers, so the two are always field-for-field identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: ReadingId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_status: Option<TemperatureStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_status: Option<DistanceStatus>,

    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for TemperatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TemperatureStatus {
    /// Matches the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureStatus::Cold => "Cold",
            TemperatureStatus::Hot => "Hot",
            TemperatureStatus::VeryHot => "VeryHot",
        }
    }
}

impl std::str::FromStr for TemperatureStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cold" => Ok(TemperatureStatus::Cold),
            "Hot" => Ok(TemperatureStatus::Hot),
            "VeryHot" => Ok(TemperatureStatus::VeryHot),
            other => Err(format!("unknown temperature status: {other}")),
        }
    }
}

impl std::fmt::Display for DistanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DistanceStatus {
    /// Matches the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceStatus::Far => "Far",
            DistanceStatus::Near => "Near",
            DistanceStatus::VeryNear => "VeryNear",
        }
    }
}

impl std::str::FromStr for DistanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Far" => Ok(DistanceStatus::Far),
            "Near" => Ok(DistanceStatus::Near),
            "VeryNear" => Ok(DistanceStatus::VeryNear),
            other => Err(format!("unknown distance status: {other}")),
        }
    }
}
