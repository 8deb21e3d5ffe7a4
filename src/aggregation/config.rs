use chrono::{FixedOffset, Offset, Utc};

/// Points a record earns for each field it carries.
#[derive(Debug, Clone)]
pub struct CompletenessWeights {
    pub systolic: u32,
    pub diastolic: u32,
    pub pulse: u32,
    pub oxygen_saturation: u32,
    pub body_temperature: u32,
    pub respiratory_rate: u32,
    pub heart_rate_variability: u32,
    pub resting_heart_rate: u32,
    pub walking_heart_rate: u32,
    pub weather_temperature: u32,
    pub weather_condition: u32,
    pub aqi: u32,
    pub pm2_5: u32,
    pub pm10: u32,
    /// Any non-empty symptom set, regardless of size
    pub symptoms: u32,
    /// Note that is not blank after trimming
    pub note: u32,
    /// Both latitude and longitude present
    pub coordinate: u32,
}

impl Default for CompletenessWeights {
    fn default() -> Self {
        Self {
            systolic: 3,
            diastolic: 3,
            pulse: 3,
            oxygen_saturation: 3,
            body_temperature: 2,
            respiratory_rate: 2,
            heart_rate_variability: 2,
            resting_heart_rate: 2,
            walking_heart_rate: 2,
            weather_temperature: 2,
            weather_condition: 1,
            aqi: 2,
            pm2_5: 2,
            pm10: 1,
            symptoms: 4,
            note: 3,
            coordinate: 1,
        }
    }
}

/// Configuration for the hourly reduction.
#[derive(Debug, Clone, Default)]
pub struct AggregationConfig {
    /// Fixed offset east of UTC used to cut hour boundaries. Applied to every record alike.
    pub utc_offset_secs: i32,
    pub weights: CompletenessWeights,
}

impl AggregationConfig {
    pub fn with_utc_offset(utc_offset_secs: i32) -> Self {
        Self {
            utc_offset_secs,
            ..Self::default()
        }
    }

    /// The offset as a chrono zone, or UTC when out of range.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or(Utc.fix())
    }
}
