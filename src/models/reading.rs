use serde::{Deserialize, Serialize};

/// Where an air quality reading came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AirQualitySource {
    SensorNetwork { sensor_id: u64 },
    CommunityIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityReading {
    /// US EPA AQI. Unbounded above; displays conventionally cap at 500.
    pub aqi: f64,
    /// µg/m³
    pub pm2_5: f64,
    /// µg/m³
    pub pm10: Option<f64>,
    pub source: AirQualitySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeatherSource {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub temperature_c: f64,
    pub condition: String,
    pub source: WeatherSource,
}
