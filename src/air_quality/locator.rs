//! Sensor Locator: bounding-box search, typed row decoding, freshness filter and distance ranking.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::models::{BoundingBox, Coordinate, PollutantWindows, Sensor};
use crate::providers::{Cell, ProviderError, SensorNetwork, SensorTable};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Roughly 100 km either side of the center at mid latitudes.
pub const DEFAULT_RADIUS_DEG: f64 = 0.9;
pub const DEFAULT_MAX_AGE_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct LocatorConfig {
    pub radius_deg: f64,
    /// Sensors not seen within this window are dropped.
    pub max_age: TimeDelta,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            radius_deg: DEFAULT_RADIUS_DEG,
            max_age: TimeDelta::seconds(DEFAULT_MAX_AGE_SECS),
        }
    }
}

static MISSING: Cell = Cell::Null;

/// Column positions resolved once from the response's field list.
#[derive(Debug)]
struct ColumnMap {
    id: usize,
    name: Option<usize>,
    latitude: usize,
    longitude: usize,
    location_type: usize,
    last_seen: usize,
    pm2_5: Option<usize>,
    pm2_5_10minute: Option<usize>,
    pm2_5_30minute: Option<usize>,
    pm2_5_60minute: Option<usize>,
}

impl ColumnMap {
    fn from_fields(fields: &[String]) -> Result<Self, ProviderError> {
        let find = |name: &str| fields.iter().position(|field| field == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| ProviderError::Schema(format!("search response lacks '{name}'")))
        };

        Ok(Self {
            id: require("sensor_index")?,
            name: find("name"),
            latitude: require("latitude")?,
            longitude: require("longitude")?,
            location_type: require("location_type")?,
            last_seen: require("last_seen")?,
            pm2_5: find("pm2.5"),
            pm2_5_10minute: find("pm2.5_10minute"),
            pm2_5_30minute: find("pm2.5_30minute"),
            pm2_5_60minute: find("pm2.5_60minute"),
        })
    }

    fn decode(&self, row: &[Cell]) -> Result<Sensor, String> {
        let cell = |index: usize| row.get(index).unwrap_or(&MISSING);
        let optional = |index: Option<usize>| index.and_then(|i| cell(i).as_f64());

        let raw_id = cell(self.id)
            .as_i64()
            .ok_or_else(|| format!("sensor_index {:?} is not an integer", cell(self.id)))?;
        let id = u64::try_from(raw_id).map_err(|_| format!("negative sensor_index {raw_id}"))?;

        let latitude = cell(self.latitude)
            .as_f64()
            .ok_or_else(|| format!("sensor {id}: missing latitude"))?;
        let longitude = cell(self.longitude)
            .as_f64()
            .ok_or_else(|| format!("sensor {id}: missing longitude"))?;
        let coordinate = Coordinate::new(latitude, longitude);
        if !coordinate.is_valid() {
            return Err(format!("sensor {id}: position {latitude},{longitude} out of range"));
        }

        let location_type = cell(self.location_type)
            .as_i64()
            .ok_or_else(|| format!("sensor {id}: missing location_type"))?;
        let last_seen_secs = cell(self.last_seen)
            .as_i64()
            .ok_or_else(|| format!("sensor {id}: missing last_seen"))?;
        let last_seen = Utc
            .timestamp_opt(last_seen_secs, 0)
            .single()
            .ok_or_else(|| format!("sensor {id}: last_seen {last_seen_secs} out of range"))?;

        let name = self
            .name
            .and_then(|i| cell(i).as_text())
            .unwrap_or_else(|| format!("Sensor {id}"));

        Ok(Sensor {
            id,
            name,
            coordinate,
            // PurpleAir: 0 = outside, 1 = inside
            outdoor: location_type == 0,
            last_seen,
            readings: PollutantWindows {
                pm2_5: optional(self.pm2_5),
                pm2_5_10minute: optional(self.pm2_5_10minute),
                pm2_5_30minute: optional(self.pm2_5_30minute),
                pm2_5_60minute: optional(self.pm2_5_60minute),
            },
            distance_km: None,
        })
    }
}

/// Decodes every parseable row. A malformed row is skipped; a missing required column fails
/// the whole table.
pub fn decode_sensors(table: &SensorTable) -> Result<Vec<Sensor>, ProviderError> {
    let columns = ColumnMap::from_fields(&table.fields)?;

    let mut sensors = Vec::with_capacity(table.data.len());
    for row in &table.data {
        match columns.decode(row) {
            Ok(sensor) => sensors.push(sensor),
            Err(reason) => log_warn!("skipping sensor row: {reason}"),
        }
    }
    Ok(sensors)
}

/// Keeps outdoor sensors seen within `max_age` of `now`, attaches distance from `center` and
/// sorts nearest first. Equal distances order by ascending id.
pub fn rank_sensors(
    sensors: Vec<Sensor>,
    center: Coordinate,
    now: DateTime<Utc>,
    max_age: TimeDelta,
) -> Vec<Sensor> {
    let mut kept: Vec<Sensor> = sensors
        .into_iter()
        .filter(|sensor| sensor.outdoor && now - sensor.last_seen <= max_age)
        .map(|mut sensor| {
            sensor.distance_km = Some(center.distance_km(&sensor.coordinate));
            sensor
        })
        .collect();

    kept.sort_by(|a, b| {
        let a_km = a.distance_km.unwrap_or(f64::INFINITY);
        let b_km = b.distance_km.unwrap_or(f64::INFINITY);
        a_km.total_cmp(&b_km).then(a.id.cmp(&b.id))
    });
    kept
}

/// Finds fresh outdoor sensors around `center`, nearest first. An empty list is a normal outcome.
pub async fn locate<N: SensorNetwork>(
    network: &N,
    center: Coordinate,
    config: &LocatorConfig,
) -> Result<Vec<Sensor>, ProviderError> {
    locate_at(network, center, config, Utc::now()).await
}

pub async fn locate_at<N: SensorNetwork>(
    network: &N,
    center: Coordinate,
    config: &LocatorConfig,
    now: DateTime<Utc>,
) -> Result<Vec<Sensor>, ProviderError> {
    let area = BoundingBox::around(center, config.radius_deg);
    let table = network.search(area).await?;
    let decoded = decode_sensors(&table)?;
    let total = decoded.len();

    let ranked = rank_sensors(decoded, center, now, config.max_age);
    log_debug!(
        "sensor search returned {} rows, {} usable after filtering",
        total,
        ranked.len()
    );
    Ok(ranked)
}
