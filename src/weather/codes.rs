/// Condition text for a WMO weather code as reported by Open-Meteo.
///
/// Unmapped codes map to "Unknown"; this never fails.
pub fn describe_weather_code(code: i64) -> &'static str {
    match code {
        0 => "Clear sky",
        1..=3 => "Partly cloudy",
        45 | 48 => "Fog",
        51..=57 => "Drizzle",
        61..=67 => "Rain",
        71..=77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95..=99 => "Thunderstorm",
        _ => UNKNOWN_CONDITION,
    }
}

pub const UNKNOWN_CONDITION: &str = "Unknown";
