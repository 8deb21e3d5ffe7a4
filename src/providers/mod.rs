//! External data providers.
//!
//! Each provider reduces a third-party HTTP API to one of the traits below so the resolvers can
//! be driven by in-memory fakes in tests.

pub mod cell;
pub mod open_meteo;
pub mod openweather;
pub mod purpleair;
pub mod waqi;

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use thiserror::Error;

use crate::models::{AirQualityReading, BoundingBox, Coordinate, WeatherReading};

pub use cell::Cell;
pub use open_meteo::OpenMeteoClient;
pub use openweather::OpenWeatherClient;
pub use purpleair::{PurpleAirClient, SensorDetail, SensorTable};
pub use waqi::WaqiClient;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{provider} responded with HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("unexpected response shape: {0}")]
    Schema(String),

    #[error("no usable data: {0}")]
    NoData(String),

    #[error("invalid request: {0}")]
    Configuration(String),
}

/// Coarse classification callers use to decide how loudly to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Provider,
    NoData,
    Configuration,
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::NoData(_) => ErrorKind::NoData,
            ProviderError::Configuration(_) => ErrorKind::Configuration,
            _ => ErrorKind::Provider,
        }
    }
}

/// Bounding-box search plus per-sensor detail from a sensor network.
#[allow(async_fn_in_trait)]
pub trait SensorNetwork {
    async fn search(&self, area: BoundingBox) -> Result<SensorTable, ProviderError>;

    async fn sensor_detail(&self, sensor_id: u64) -> Result<SensorDetail, ProviderError>;
}

/// A provider that answers with a precomputed index for a coordinate.
#[allow(async_fn_in_trait)]
pub trait AirIndexProvider {
    async fn air_quality(&self, at: Coordinate) -> Result<AirQualityReading, ProviderError>;
}

#[allow(async_fn_in_trait)]
pub trait WeatherProvider {
    async fn current(&self, at: Coordinate) -> Result<WeatherReading, ProviderError>;
}

/// Logs a swallowed provider failure. Configuration problems are programming errors and get
/// their own level so they stand out from routine outages.
pub(crate) fn report_failure(source: &str, err: &ProviderError) {
    match err.kind() {
        ErrorKind::Configuration => log::error!("{source}: request could not be built: {err}"),
        ErrorKind::NoData => log::info!("{source}: {err}"),
        ErrorKind::Provider => log::warn!("{source} unavailable: {err}"),
    }
}

pub fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("airvitals/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| ProviderError::Configuration(format!("cannot build HTTP client: {err}")))
}

/// Sends the request and returns the body of a successful response.
pub(crate) async fn fetch_body(
    request: RequestBuilder,
    provider: &'static str,
) -> Result<String, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
        });
    }

    Ok(response.text().await?)
}

pub(crate) fn parse_url(raw: &str) -> Result<reqwest::Url, ProviderError> {
    reqwest::Url::parse(raw).map_err(|err| ProviderError::Configuration(format!("{raw}: {err}")))
}
