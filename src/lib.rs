pub mod aggregation;
pub mod air_quality;
pub mod aqi;
pub mod cli;
pub mod db;
pub mod history;
pub mod models;
pub mod providers;
pub mod refresh;
pub mod settings;
pub mod snapshot;
pub mod utils;
pub mod weather;

#[cfg(test)]
mod testing;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use air_quality::AirQualityResolver;
use db::Database;
use providers::{http_client, OpenMeteoClient, OpenWeatherClient, PurpleAirClient, WaqiClient};
use refresh::RefreshController;
use settings::{Settings, SettingsStore};
use snapshot::SnapshotBuilder;
use weather::WeatherResolver;

pub type LiveSnapshotBuilder =
    SnapshotBuilder<OpenWeatherClient, OpenMeteoClient, PurpleAirClient, WaqiClient>;

pub type LiveRefreshController =
    RefreshController<OpenWeatherClient, OpenMeteoClient, PurpleAirClient, WaqiClient>;

const SETTINGS_FILE: &str = "settings.json";

/// Wires the real providers from `settings`. Missing keys leave a provider unconfigured; it then
/// fails softly at request time and the resolvers fall through to the next source.
pub fn live_snapshot_builder(settings: &Settings) -> Result<LiveSnapshotBuilder> {
    let client = http_client(settings.http_timeout()).context("failed to build HTTP client")?;

    Ok(SnapshotBuilder::new(
        WeatherResolver::new(
            OpenWeatherClient::new(client.clone(), settings.openweather_api_key.clone()),
            OpenMeteoClient::new(client.clone()),
        ),
        AirQualityResolver::new(
            PurpleAirClient::new(client.clone(), settings.purpleair_api_key.clone()),
            settings.locator(),
        ),
        WaqiClient::new(client, settings.waqi_token.clone()),
    ))
}

pub struct AppState {
    pub db: Database,
    pub settings: SettingsStore,
    pub refresh: LiveRefreshController,
}

impl AppState {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let db = Database::open_in(data_dir).context("failed to open record log")?;
        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))
            .context("failed to load settings")?;
        let builder = live_snapshot_builder(&settings.effective()?)?;

        Ok(Self {
            refresh: RefreshController::new(builder, db.clone()),
            db,
            settings,
        })
    }
}

pub async fn run() -> Result<()> {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::debug!("airvitals starting up");
    cli::Cli::parse().execute().await
}
