//! OpenWeatherMap current conditions, the primary weather source. Requires an API key.

use reqwest::Client;
use serde::Deserialize;

use super::{fetch_body, ProviderError, WeatherProvider};
use crate::models::{Coordinate, WeatherReading, WeatherSource};

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const PROVIDER: &str = "OpenWeatherMap";

#[derive(Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: MainBlock,
}

#[derive(Deserialize)]
struct Condition {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
}

pub fn parse_current(body: &str) -> Result<WeatherReading, ProviderError> {
    let response: CurrentResponse = serde_json::from_str(body)?;
    let condition = response
        .weather
        .first()
        .map(|c| {
            if c.description.trim().is_empty() {
                c.main.clone()
            } else {
                capitalize(c.description.trim())
            }
        })
        .ok_or_else(|| ProviderError::NoData("no weather condition in response".into()))?;

    Ok(WeatherReading {
        temperature_c: response.main.temp,
        condition,
        source: WeatherSource::Primary,
    })
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self::with_base_url(client, api_key, OPENWEATHER_URL)
    }

    pub fn with_base_url(client: Client, api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, at: Coordinate) -> Result<WeatherReading, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured(PROVIDER))?;
        let url = super::parse_url(&self.base_url)?;
        let request = self.client.get(url).query(&[
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
            ("units", "metric".to_string()),
            ("appid", api_key.to_string()),
        ]);

        let body = fetch_body(request, PROVIDER).await?;
        parse_current(&body)
    }
}
