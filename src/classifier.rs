//! Threshold classification of raw sensor values
//!
//! Every function here is pure: the same input always yields the same
//! output, and nothing is logged or stored.

use crate::{DistanceStatus, SensorPayload, TemperatureStatus};

/// Upper bound (inclusive) of the `Cold` band, in °C
pub const COLD_MAX: f64 = 40.0;

/// Upper bound (inclusive) of the `Hot` band, in °C
pub const HOT_MAX: f64 = 70.0;

/// Upper bound (inclusive) of the `VeryNear` band, in cm
pub const VERY_NEAR_MAX: f64 = 50.0;

/// Upper bound (inclusive) of the `Near` band, in cm
pub const NEAR_MAX: f64 = 100.0;

pub fn classify_temperature(value: Option<f64>) -> Option<TemperatureStatus> {
    let value = value?;

    if value <= COLD_MAX {
        return Some(TemperatureStatus::Cold);
    }

    if value <= HOT_MAX {
        return Some(TemperatureStatus::Hot);
    }

    Some(TemperatureStatus::VeryHot)
}

pub fn classify_distance(value: Option<f64>) -> Option<DistanceStatus> {
    let value = value?;

    // very near has to be checked first, far is only "above the near band"
    if value <= VERY_NEAR_MAX {
        return Some(DistanceStatus::VeryNear);
    }

    if value > NEAR_MAX {
        return Some(DistanceStatus::Far);
    }

    Some(DistanceStatus::Near)
}

/// Derived alert flag returned to the device after an ingest
///
/// Absent metrics count as `0`, so they can never raise the alert on their own.
pub fn alert_signal(temperature: Option<f64>, distance: Option<f64>) -> bool {
    distance.unwrap_or(0.0) > VERY_NEAR_MAX || temperature.unwrap_or(0.0) > COLD_MAX
}

/// Classification of a whole payload at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub temperature_status: Option<TemperatureStatus>,
    pub distance_status: Option<DistanceStatus>,
    pub alert: bool,
}

impl Classification {
    pub fn of(payload: &SensorPayload) -> Self {
        Self {
            temperature_status: classify_temperature(payload.temperature),
            distance_status: classify_distance(payload.distance),
            alert: alert_signal(payload.temperature, payload.distance),
        }
    }
}
