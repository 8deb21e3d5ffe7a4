//! Open-Meteo current conditions, the key-less secondary weather source.
//!
//! Conditions arrive as WMO weather codes and are translated through the fixed table in
//! [`crate::weather::codes`].

use reqwest::Client;
use serde::Deserialize;

use super::{fetch_body, ProviderError, WeatherProvider};
use crate::models::{Coordinate, WeatherReading, WeatherSource};
use crate::weather::codes::describe_weather_code;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const PROVIDER: &str = "Open-Meteo";

#[derive(Deserialize)]
struct ForecastResponse {
    current: Current,
}

#[derive(Deserialize)]
struct Current {
    temperature_2m: f64,
    weather_code: i64,
}

pub fn parse_current(body: &str) -> Result<WeatherReading, ProviderError> {
    let payload: ForecastResponse = serde_json::from_str(body)?;

    Ok(WeatherReading {
        temperature_c: payload.current.temperature_2m,
        condition: describe_weather_code(payload.current.weather_code).to_string(),
        source: WeatherSource::Secondary,
    })
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, FORECAST_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl WeatherProvider for OpenMeteoClient {
    async fn current(&self, at: Coordinate) -> Result<WeatherReading, ProviderError> {
        let url = super::parse_url(&self.base_url)?;
        let request = self.client.get(url).query(&[
            ("latitude", at.latitude.to_string()),
            ("longitude", at.longitude.to_string()),
            ("current", "temperature_2m,weather_code".to_string()),
        ]);

        let body = fetch_body(request, PROVIDER).await?;
        parse_current(&body)
    }
}
