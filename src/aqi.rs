//! PM2.5 concentration to US EPA Air Quality Index.
//!
//! Breakpoints from the EPA technical assistance document:
//! https://document.airnow.gov/technical-assistance-document-for-the-reporting-of-daily-air-quailty.pdf
//! Ranges are contiguous so the interpolation is continuous at every edge.

use serde::{Deserialize, Serialize};

/// (conc_low, conc_high, index_low, index_high), ordered, non-overlapping.
const PM25_BREAKPOINTS: [(f64, f64, f64, f64); 7] = [
    (0.0, 12.0, 0.0, 50.0),       // Good
    (12.0, 35.4, 50.0, 100.0),    // Moderate
    (35.4, 55.4, 100.0, 150.0),   // Unhealthy for Sensitive Groups
    (55.4, 150.4, 150.0, 200.0),  // Unhealthy
    (150.4, 250.4, 200.0, 300.0), // Very Unhealthy
    (250.4, 350.4, 300.0, 400.0), // Hazardous
    (350.4, 500.4, 400.0, 500.0), // Hazardous
];

pub const MAX_INDEX: f64 = 500.0;

/// Converts a PM2.5 concentration (µg/m³) to an AQI value.
///
/// Total over non-negative input. The first range containing the value wins; anything past the
/// top of the table clamps to 500. Callers must reject negative concentrations.
pub fn pm25_to_index(concentration: f64) -> f64 {
    for (conc_low, conc_high, index_low, index_high) in PM25_BREAKPOINTS {
        if concentration >= conc_low && concentration <= conc_high {
            // AQI = (Ihigh - Ilow) / (Chigh - Clow) * (C - Clow) + Ilow
            return index_low
                + (index_high - index_low) / (conc_high - conc_low) * (concentration - conc_low);
        }
    }

    MAX_INDEX
}

/// EPA reporting category for an index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_index(index: f64) -> Self {
        match index.round() as i64 {
            i64::MIN..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn breakpoint_edges() {
        assert!(close(pm25_to_index(0.0), 0.0));
        assert!(close(pm25_to_index(12.0), 50.0));
        assert!(close(pm25_to_index(35.4), 100.0));
        assert!(close(pm25_to_index(55.4), 150.0));
        assert!(close(pm25_to_index(500.4), 500.0));
    }

    #[test]
    fn interpolates_inside_a_range() {
        // Halfway through the Moderate band.
        assert!(close(pm25_to_index(23.7), 75.0));
    }

    #[test]
    fn clamps_above_table() {
        assert!(close(pm25_to_index(500.5), 500.0));
        assert!(close(pm25_to_index(10_000.0), 500.0));
    }

    #[test]
    fn monotonically_non_decreasing() {
        let mut previous = pm25_to_index(0.0);
        let mut concentration = 0.0;
        while concentration <= 600.0 {
            let index = pm25_to_index(concentration);
            assert!(
                index + 1e-9 >= previous,
                "index dropped at {concentration}: {previous} -> {index}"
            );
            previous = index;
            concentration += 0.05;
        }
    }

    #[test]
    fn categories_follow_epa_bands() {
        assert_eq!(AqiCategory::from_index(0.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_index(50.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_index(75.0), AqiCategory::Moderate);
        assert_eq!(
            AqiCategory::from_index(pm25_to_index(40.0)),
            AqiCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(AqiCategory::from_index(250.0), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_index(612.0), AqiCategory::Hazardous);
    }
}
