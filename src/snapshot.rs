//! Environmental Snapshot Builder.
//!
//! Weather and air quality are resolved concurrently with `tokio::join!`: both branches always
//! run to completion and write disjoint halves of the result, so one failing never cancels or
//! blocks the other.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::air_quality::AirQualityResolver;
use crate::models::{AirQualityReading, Coordinate, WeatherReading};
use crate::providers::{report_failure, AirIndexProvider, SensorNetwork, WeatherProvider};
use crate::weather::WeatherResolver;

const ENABLE_LOGS: bool = true;

use crate::log_info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotStatus {
    Complete,
    Partial,
    Failed,
}

impl SnapshotStatus {
    /// Only a total failure is worth interrupting the user for.
    pub fn is_actionable_error(&self) -> bool {
        matches!(self, SnapshotStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub coordinate: Coordinate,
    pub taken_at: DateTime<Utc>,
    pub weather: Option<WeatherReading>,
    pub air: Option<AirQualityReading>,
}

impl Snapshot {
    pub fn status(&self) -> SnapshotStatus {
        match (&self.weather, &self.air) {
            (Some(_), Some(_)) => SnapshotStatus::Complete,
            (None, None) => SnapshotStatus::Failed,
            _ => SnapshotStatus::Partial,
        }
    }

    pub fn status_message(&self) -> &'static str {
        match (&self.weather, &self.air) {
            (Some(_), Some(_)) => "Weather and air quality updated",
            (Some(_), None) => "Weather updated; air quality unavailable",
            (None, Some(_)) => "Air quality updated; weather unavailable",
            (None, None) => "Could not fetch weather or air quality. Check your connection and try again.",
        }
    }
}

pub struct SnapshotBuilder<WP, WS, N, A> {
    weather: WeatherResolver<WP, WS>,
    air: AirQualityResolver<N>,
    fallback_air: A,
}

impl<WP, WS, N, A> SnapshotBuilder<WP, WS, N, A>
where
    WP: WeatherProvider,
    WS: WeatherProvider,
    N: SensorNetwork,
    A: AirIndexProvider,
{
    pub fn new(weather: WeatherResolver<WP, WS>, air: AirQualityResolver<N>, fallback_air: A) -> Self {
        Self {
            weather,
            air,
            fallback_air,
        }
    }

    pub fn air_resolver(&self) -> &AirQualityResolver<N> {
        &self.air
    }

    /// Sensor network first, community index when it yields nothing.
    async fn resolve_air(
        &self,
        center: Coordinate,
        preferred_sensor_id: Option<u64>,
    ) -> Option<AirQualityReading> {
        if let Some(reading) = self.air.resolve(center, preferred_sensor_id).await {
            return Some(reading);
        }

        log_info!("sensor network gave no reading, trying community index");
        match self.fallback_air.air_quality(center).await {
            Ok(reading) => Some(reading),
            Err(err) => {
                report_failure("community air index", &err);
                None
            }
        }
    }

    /// Never fails: any combination of present and missing halves is a valid snapshot.
    pub async fn build(&self, center: Coordinate, preferred_sensor_id: Option<u64>) -> Snapshot {
        let taken_at = Utc::now();
        let (weather, air) = tokio::join!(
            self.weather.resolve(center),
            self.resolve_air(center, preferred_sensor_id),
        );

        let snapshot = Snapshot {
            coordinate: center,
            taken_at,
            weather,
            air,
        };
        log_info!("snapshot for {:.4},{:.4}: {:?}", center.latitude, center.longitude, snapshot.status());
        snapshot
    }
}
