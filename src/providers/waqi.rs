//! World Air Quality Index geo feed, used as the secondary air quality source.
//!
//! The feed already carries a computed index, so no conversion happens here.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::Deserialize;

use super::{fetch_body, AirIndexProvider, Cell, ProviderError};
use crate::models::{AirQualityReading, AirQualitySource, Coordinate};

const WAQI_URL: &str = "https://api.waqi.info";
const PROVIDER: &str = "WAQI";

#[derive(Deserialize)]
struct FeedResponse {
    status: String,
    data: FeedData,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedData {
    Feed(Feed),
    Message(String),
}

#[derive(Deserialize)]
struct Feed {
    aqi: Cell,
    #[serde(default)]
    iaqi: BTreeMap<String, Component>,
}

#[derive(Deserialize)]
struct Component {
    v: Cell,
}

/// `iaqi` components are per-pollutant sub-indices, not µg/m³, so `pm2_5`/`pm10` from this feed
/// are not comparable with sensor-network concentrations.
pub fn parse_feed(body: &str) -> Result<AirQualityReading, ProviderError> {
    let response: FeedResponse = serde_json::from_str(body)?;

    let feed = match (response.status.as_str(), response.data) {
        ("ok", FeedData::Feed(feed)) => feed,
        (_, FeedData::Message(message)) => {
            return Err(ProviderError::Api {
                provider: PROVIDER,
                message,
            })
        }
        (status, FeedData::Feed(_)) => {
            return Err(ProviderError::Api {
                provider: PROVIDER,
                message: format!("status '{status}'"),
            })
        }
    };

    // Stations without a current index report "-".
    let aqi = feed
        .aqi
        .as_f64()
        .ok_or_else(|| ProviderError::NoData("station has no current index".into()))?;
    let component = |key: &str| feed.iaqi.get(key).and_then(|c| c.v.as_f64());
    let pm2_5 = component("pm25")
        .ok_or_else(|| ProviderError::NoData("station reports no PM2.5".into()))?;

    Ok(AirQualityReading {
        aqi,
        pm2_5,
        pm10: component("pm10"),
        source: AirQualitySource::CommunityIndex,
    })
}

#[derive(Debug, Clone)]
pub struct WaqiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl WaqiClient {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self::with_base_url(client, token, WAQI_URL)
    }

    pub fn with_base_url(client: Client, token: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

impl AirIndexProvider for WaqiClient {
    async fn air_quality(&self, at: Coordinate) -> Result<AirQualityReading, ProviderError> {
        let token = self
            .token
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))?;
        let url = super::parse_url(&format!(
            "{}/feed/geo:{};{}/",
            self.base_url, at.latitude, at.longitude
        ))?;
        let request = self.client.get(url).query(&[("token", token)]);

        let body = fetch_body(request, PROVIDER).await?;
        parse_feed(&body)
    }
}
