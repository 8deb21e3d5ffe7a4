//! Sensor-network station model.
//!
//! Sensors are transient: they are rebuilt from the provider on every locate call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinate;

/// PM2.5 readings at the averaging windows the sensor network reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollutantWindows {
    pub pm2_5: Option<f64>,
    pub pm2_5_10minute: Option<f64>,
    pub pm2_5_30minute: Option<f64>,
    pub pm2_5_60minute: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: u64,
    pub name: String,
    pub coordinate: Coordinate,
    pub outdoor: bool,
    pub last_seen: DateTime<Utc>,
    pub readings: PollutantWindows,
    /// Kilometres from the locate center. Only set by the locator.
    pub distance_km: Option<f64>,
}
