//! Log record model.
//!
//! A record joins on-device vitals, the environmental snapshot taken at the same time,
//! a free-text note and symptom tags. Every numeric field is independently optional.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AirQualityReading, Coordinate, WeatherReading};

/// On-device physiological metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub pulse: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub body_temperature_c: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub heart_rate_variability_ms: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub walking_heart_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordWeather {
    pub temperature_c: Option<f64>,
    pub condition: Option<String>,
}

impl From<&WeatherReading> for RecordWeather {
    fn from(reading: &WeatherReading) -> Self {
        Self {
            temperature_c: Some(reading.temperature_c),
            condition: Some(reading.condition.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAir {
    pub aqi: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

impl From<&AirQualityReading> for RecordAir {
    fn from(reading: &AirQualityReading) -> Self {
        Self {
            aqi: Some(reading.aqi),
            pm2_5: Some(reading.pm2_5),
            pm10: reading.pm10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Symptom {
    Headache,
    Cough,
    ShortnessOfBreath,
    Wheezing,
    ChestTightness,
    Fatigue,
    Dizziness,
    Nausea,
    SoreThroat,
    RunnyNose,
    ItchyEyes,
    Other(String),
}

impl Symptom {
    pub fn label(&self) -> &str {
        match self {
            Symptom::Headache => "headache",
            Symptom::Cough => "cough",
            Symptom::ShortnessOfBreath => "shortness of breath",
            Symptom::Wheezing => "wheezing",
            Symptom::ChestTightness => "chest tightness",
            Symptom::Fatigue => "fatigue",
            Symptom::Dizziness => "dizziness",
            Symptom::Nausea => "nausea",
            Symptom::SoreThroat => "sore throat",
            Symptom::RunnyNose => "runny nose",
            Symptom::ItchyEyes => "itchy eyes",
            Symptom::Other(text) => text.as_str(),
        }
    }

    /// Parses a user-entered tag. Anything outside the closed set becomes `Other`.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase().replace(['-', '_'], " ");
        if normalized.is_empty() {
            return None;
        }

        let symptom = match normalized.as_str() {
            "headache" => Symptom::Headache,
            "cough" => Symptom::Cough,
            "shortness of breath" => Symptom::ShortnessOfBreath,
            "wheezing" => Symptom::Wheezing,
            "chest tightness" => Symptom::ChestTightness,
            "fatigue" => Symptom::Fatigue,
            "dizziness" => Symptom::Dizziness,
            "nausea" => Symptom::Nausea,
            "sore throat" => Symptom::SoreThroat,
            "runny nose" => Symptom::RunnyNose,
            "itchy eyes" => Symptom::ItchyEyes,
            _ => Symptom::Other(value.trim().to_string()),
        };
        Some(symptom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default)]
    pub weather: RecordWeather,
    #[serde(default)]
    pub air: RecordAir,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub symptoms: BTreeSet<Symptom>,
    pub coordinate: Option<Coordinate>,
}

impl Record {
    /// Creates an empty record with a fresh identity.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            vitals: Vitals::default(),
            weather: RecordWeather::default(),
            air: RecordAir::default(),
            note: String::new(),
            symptoms: BTreeSet::new(),
            coordinate: None,
        }
    }

    pub fn has_note(&self) -> bool {
        !self.note.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_records_get_distinct_ids() {
        let now = Utc::now();
        assert_ne!(Record::new(now).id, Record::new(now).id);
    }

    #[test]
    fn parses_known_and_free_text_symptoms() {
        assert_eq!(Symptom::parse("Shortness-of-breath"), Some(Symptom::ShortnessOfBreath));
        assert_eq!(Symptom::parse(" itchy_eyes "), Some(Symptom::ItchyEyes));
        assert_eq!(
            Symptom::parse("metallic taste"),
            Some(Symptom::Other("metallic taste".into()))
        );
        assert_eq!(Symptom::parse("   "), None);
    }

    #[test]
    fn record_json_tolerates_missing_sections() {
        let json = r#"{"id":"abc","timestamp":"2024-05-01T10:15:00Z","coordinate":null}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "abc");
        assert_eq!(record.vitals, Vitals::default());
        assert!(record.symptoms.is_empty());
        assert!(!record.has_note());
    }
}
