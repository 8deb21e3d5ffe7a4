//! PurpleAir v1 sensor network.
//!
//! Search returns a column list plus rows of mixed-type cells. Detail returns a flat object
//! whose pollutant keys contain `.` (`pm2.5_10minute`) and an optional nested `stats` object,
//! so both are kept as raw string-keyed maps.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::de::IgnoredAny;
use serde::Deserialize;

use super::{fetch_body, Cell, ProviderError, SensorNetwork};
use crate::models::BoundingBox;

const PURPLEAIR_URL: &str = "https://api.purpleair.com/v1";
const PROVIDER: &str = "PurpleAir";

/// Columns requested from the search endpoint. `sensor_index` is always prepended by the API.
pub const SEARCH_FIELDS: &str =
    "name,latitude,longitude,location_type,last_seen,pm2.5,pm2.5_10minute,pm2.5_30minute,pm2.5_60minute";

/// Raw bounding-box search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorTable {
    pub fields: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Cell>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetailEntry {
    Value(Cell),
    Group(BTreeMap<String, DetailEntry>),
    Ignored(IgnoredAny),
}

#[derive(Deserialize)]
struct DetailEnvelope {
    sensor: BTreeMap<String, DetailEntry>,
}

/// Scalar fields of a single sensor plus its nested `stats` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorDetail {
    pub fields: BTreeMap<String, Cell>,
    pub stats: BTreeMap<String, Cell>,
}

impl SensorDetail {
    fn from_entries(entries: BTreeMap<String, DetailEntry>) -> Self {
        let mut detail = SensorDetail::default();
        for (key, entry) in entries {
            match entry {
                DetailEntry::Value(cell) => {
                    detail.fields.insert(key, cell);
                }
                DetailEntry::Group(group) if key == "stats" => {
                    for (stat_key, stat_entry) in group {
                        if let DetailEntry::Value(cell) = stat_entry {
                            detail.stats.insert(stat_key, cell);
                        }
                    }
                }
                DetailEntry::Group(_) | DetailEntry::Ignored(_) => {}
            }
        }
        detail
    }

    /// First numeric value among `keys` in the flat fields.
    pub fn flat(&self, keys: &[&str]) -> Option<f64> {
        first_numeric(&self.fields, keys)
    }

    /// First numeric value among `keys` in the nested `stats` block.
    pub fn nested(&self, keys: &[&str]) -> Option<f64> {
        first_numeric(&self.stats, keys)
    }
}

fn first_numeric(map: &BTreeMap<String, Cell>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(Cell::as_f64)
}

pub fn parse_search(body: &str) -> Result<SensorTable, ProviderError> {
    Ok(serde_json::from_str(body)?)
}

pub fn parse_detail(body: &str) -> Result<SensorDetail, ProviderError> {
    let envelope: DetailEnvelope = serde_json::from_str(body)?;
    Ok(SensorDetail::from_entries(envelope.sensor))
}

#[derive(Debug, Clone)]
pub struct PurpleAirClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PurpleAirClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self::with_base_url(client, api_key, PURPLEAIR_URL)
    }

    pub fn with_base_url(
        client: Client,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))
    }
}

impl SensorNetwork for PurpleAirClient {
    async fn search(&self, area: BoundingBox) -> Result<SensorTable, ProviderError> {
        let api_key = self.api_key()?;
        let url = super::parse_url(&format!("{}/sensors", self.base_url))?;
        let request = self
            .client
            .get(url)
            .header("X-API-Key", api_key)
            .query(&[
                ("fields", SEARCH_FIELDS.to_string()),
                ("nwlng", area.west.to_string()),
                ("nwlat", area.north.to_string()),
                ("selng", area.east.to_string()),
                ("selat", area.south.to_string()),
            ]);

        let body = fetch_body(request, PROVIDER).await?;
        parse_search(&body)
    }

    async fn sensor_detail(&self, sensor_id: u64) -> Result<SensorDetail, ProviderError> {
        let api_key = self.api_key()?;
        let url = super::parse_url(&format!("{}/sensors/{sensor_id}", self.base_url))?;
        let request = self.client.get(url).header("X-API-Key", api_key);

        let body = fetch_body(request, PROVIDER).await?;
        parse_detail(&body)
    }
}
