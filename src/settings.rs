use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use chrono::TimeDelta;

use crate::aggregation::AggregationConfig;
use crate::air_quality::locator::{DEFAULT_MAX_AGE_SECS, DEFAULT_RADIUS_DEG};
use crate::air_quality::LocatorConfig;

pub const PURPLEAIR_KEY_ENV: &str = "PURPLEAIR_API_KEY";
pub const OPENWEATHER_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const WAQI_TOKEN_ENV: &str = "WAQI_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub purpleair_api_key: Option<String>,
    pub openweather_api_key: Option<String>,
    pub waqi_token: Option<String>,
    pub preferred_sensor_id: Option<u64>,
    pub search_radius_deg: f64,
    pub sensor_max_age_secs: i64,
    pub utc_offset_secs: i32,
    pub history_timeout_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            purpleair_api_key: None,
            openweather_api_key: None,
            waqi_token: None,
            preferred_sensor_id: None,
            search_radius_deg: DEFAULT_RADIUS_DEG,
            sensor_max_age_secs: DEFAULT_MAX_AGE_SECS,
            utc_offset_secs: 0,
            history_timeout_secs: 30,
            http_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Non-empty environment variables win over stored keys.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let pick = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(key) = pick(PURPLEAIR_KEY_ENV) {
            self.purpleair_api_key = Some(key);
        }
        if let Some(key) = pick(OPENWEATHER_KEY_ENV) {
            self.openweather_api_key = Some(key);
        }
        if let Some(token) = pick(WAQI_TOKEN_ENV) {
            self.waqi_token = Some(token);
        }
    }

    pub fn locator(&self) -> LocatorConfig {
        LocatorConfig {
            radius_deg: self.search_radius_deg,
            max_age: TimeDelta::try_seconds(self.sensor_max_age_secs)
                .unwrap_or_else(|| TimeDelta::seconds(DEFAULT_MAX_AGE_SECS)),
        }
    }

    pub fn aggregation(&self) -> AggregationConfig {
        AggregationConfig::with_utc_offset(self.utc_offset_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn history_timeout(&self) -> Duration {
        Duration::from_secs(self.history_timeout_secs)
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable settings at {}: {err}", path.display());
                Settings::default()
            })
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Settings>> {
        self.data.read().map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Settings>> {
        self.data.write().map_err(|_| anyhow!("settings lock poisoned"))
    }

    /// Stored values only, without environment overrides.
    pub fn stored(&self) -> Result<Settings> {
        Ok(self.read()?.clone())
    }

    /// Stored values with environment overrides applied.
    pub fn effective(&self) -> Result<Settings> {
        Ok(self.stored()?.with_env_overrides())
    }

    pub fn update(&self, apply: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut guard = self.write()?;
        let mut next = guard.clone();
        apply(&mut next);
        self.persist(&next)?;
        *guard = next.clone();
        Ok(next)
    }

    pub fn set_preferred_sensor(&self, sensor_id: Option<u64>) -> Result<()> {
        self.update(|settings| settings.preferred_sensor_id = sensor_id)
            .map(|_| ())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
