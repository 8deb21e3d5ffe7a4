//! Air Quality Resolver over the primary sensor network.
//!
//! Sensor choice is an explicit argument: a user-pinned sensor id wins, otherwise the nearest
//! fresh outdoor sensor is used. The community-index fallback lives with the snapshot builder.

use crate::aqi::pm25_to_index;
use crate::models::{AirQualityReading, AirQualitySource, Coordinate};
use crate::providers::{report_failure, SensorDetail, SensorNetwork};

use super::locator::{locate, LocatorConfig};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

// Underscore spellings show up in some proxies of the same API.
const PM25_10MIN_KEYS: [&str; 2] = ["pm2.5_10minute", "pm2_5_10minute"];
const PM25_KEYS: [&str; 2] = ["pm2.5", "pm2_5"];
const PM10_10MIN_KEYS: [&str; 2] = ["pm10.0_10minute", "pm10_0_10minute"];
const PM10_KEYS: [&str; 3] = ["pm10.0", "pm10_0", "pm10"];

/// Averaged value first, then instantaneous; for each granularity the flat field is checked
/// before the nested `stats` copy. Negative concentrations count as absent.
fn pick_concentration(detail: &SensorDetail, averaged: &[&str], instant: &[&str]) -> Option<f64> {
    usable(detail.flat(averaged))
        .or_else(|| usable(detail.nested(averaged)))
        .or_else(|| usable(detail.flat(instant)))
        .or_else(|| usable(detail.nested(instant)))
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v >= 0.0)
}

/// Builds a reading from one sensor's detail, or `None` when it carries no PM2.5 at all.
pub fn reading_from_detail(sensor_id: u64, detail: &SensorDetail) -> Option<AirQualityReading> {
    let pm2_5 = pick_concentration(detail, &PM25_10MIN_KEYS, &PM25_KEYS)?;
    let pm10 = pick_concentration(detail, &PM10_10MIN_KEYS, &PM10_KEYS);

    Some(AirQualityReading {
        aqi: pm25_to_index(pm2_5),
        pm2_5,
        pm10,
        source: AirQualitySource::SensorNetwork { sensor_id },
    })
}

pub struct AirQualityResolver<N> {
    network: N,
    locator: LocatorConfig,
}

impl<N: SensorNetwork> AirQualityResolver<N> {
    pub fn new(network: N, locator: LocatorConfig) -> Self {
        Self { network, locator }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    async fn nearest_sensor(&self, center: Coordinate) -> Option<u64> {
        match locate(&self.network, center, &self.locator).await {
            Ok(sensors) => {
                let nearest = sensors.first().map(|sensor| sensor.id);
                if nearest.is_none() {
                    log_info!("no fresh outdoor sensors within {}°", self.locator.radius_deg);
                }
                nearest
            }
            Err(err) => {
                report_failure("sensor search", &err);
                None
            }
        }
    }

    /// Returns `None` on every failure kind; the caller decides whether to try the secondary
    /// provider.
    pub async fn resolve(
        &self,
        center: Coordinate,
        preferred_sensor_id: Option<u64>,
    ) -> Option<AirQualityReading> {
        let sensor_id = match preferred_sensor_id {
            Some(id) => Some(id),
            None => self.nearest_sensor(center).await,
        }?;

        let detail = match self.network.sensor_detail(sensor_id).await {
            Ok(detail) => detail,
            Err(err) => {
                report_failure("sensor detail", &err);
                return None;
            }
        };

        let reading = reading_from_detail(sensor_id, &detail);
        match &reading {
            Some(r) => log_debug!("sensor {} -> PM2.5 {:.1} µg/m³, AQI {:.0}", sensor_id, r.pm2_5, r.aqi),
            None => log_info!("sensor {} reported no PM2.5", sensor_id),
        }
        reading
    }
}
