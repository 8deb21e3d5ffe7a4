//! Completeness Scorer.
//!
//! The score is a view over which fields a record carries. It is never stored.

use crate::models::Record;

use super::config::CompletenessWeights;

fn points(present: bool, weight: u32) -> u32 {
    if present {
        weight
    } else {
        0
    }
}

/// Score with the default weights.
pub fn score(record: &Record) -> u32 {
    completeness_score(record, &CompletenessWeights::default())
}

pub fn completeness_score(record: &Record, weights: &CompletenessWeights) -> u32 {
    let vitals = &record.vitals;
    let weather = &record.weather;
    let air = &record.air;

    let condition_present = weather
        .condition
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());

    points(vitals.systolic.is_some(), weights.systolic)
        + points(vitals.diastolic.is_some(), weights.diastolic)
        + points(vitals.pulse.is_some(), weights.pulse)
        + points(vitals.oxygen_saturation.is_some(), weights.oxygen_saturation)
        + points(vitals.body_temperature_c.is_some(), weights.body_temperature)
        + points(vitals.respiratory_rate.is_some(), weights.respiratory_rate)
        + points(
            vitals.heart_rate_variability_ms.is_some(),
            weights.heart_rate_variability,
        )
        + points(vitals.resting_heart_rate.is_some(), weights.resting_heart_rate)
        + points(vitals.walking_heart_rate.is_some(), weights.walking_heart_rate)
        + points(weather.temperature_c.is_some(), weights.weather_temperature)
        + points(condition_present, weights.weather_condition)
        + points(air.aqi.is_some(), weights.aqi)
        + points(air.pm2_5.is_some(), weights.pm2_5)
        + points(air.pm10.is_some(), weights.pm10)
        + points(!record.symptoms.is_empty(), weights.symptoms)
        + points(record.has_note(), weights.note)
        + points(record.coordinate.is_some(), weights.coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::{Coordinate, Symptom};

    #[test]
    fn empty_record_scores_zero() {
        assert_eq!(score(&Record::new(Utc::now())), 0);
    }

    #[test]
    fn core_vitals_and_symptoms() {
        let mut record = Record::new(Utc::now());
        record.vitals.systolic = Some(120.0);
        record.vitals.diastolic = Some(80.0);
        record.vitals.pulse = Some(70.0);
        record.vitals.oxygen_saturation = Some(98.0);
        record.symptoms.insert(Symptom::Headache);
        record.symptoms.insert(Symptom::Cough);

        assert_eq!(score(&record), 3 + 3 + 3 + 3 + 4);
    }

    #[test]
    fn blank_note_and_condition_do_not_count() {
        let mut record = Record::new(Utc::now());
        record.note = "   \n".into();
        record.weather.condition = Some(" ".into());
        assert_eq!(score(&record), 0);

        record.note = " felt fine ".into();
        record.weather.condition = Some("Fog".into());
        assert_eq!(score(&record), 3 + 1);
    }

    #[test]
    fn fully_populated_record_sums_every_weight() {
        let mut record = Record::new(Utc::now());
        record.vitals.systolic = Some(118.0);
        record.vitals.diastolic = Some(76.0);
        record.vitals.pulse = Some(64.0);
        record.vitals.oxygen_saturation = Some(97.0);
        record.vitals.body_temperature_c = Some(36.8);
        record.vitals.respiratory_rate = Some(14.0);
        record.vitals.heart_rate_variability_ms = Some(48.0);
        record.vitals.resting_heart_rate = Some(58.0);
        record.vitals.walking_heart_rate = Some(96.0);
        record.weather.temperature_c = Some(12.0);
        record.weather.condition = Some("Rain".into());
        record.air.aqi = Some(41.0);
        record.air.pm2_5 = Some(9.8);
        record.air.pm10 = Some(14.0);
        record.symptoms.insert(Symptom::Other("tingling".into()));
        record.note = "after run".into();
        record.coordinate = Some(Coordinate::new(47.6, -122.3));

        assert_eq!(score(&record), 38);
    }

    #[test]
    fn custom_weights_apply() {
        let mut record = Record::new(Utc::now());
        record.air.pm10 = Some(3.0);
        let weights = CompletenessWeights {
            pm10: 10,
            ..CompletenessWeights::default()
        };
        assert_eq!(completeness_score(&record, &weights), 10);
    }
}
