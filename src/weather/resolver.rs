use crate::models::{Coordinate, WeatherReading};
use crate::providers::{report_failure, WeatherProvider};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Primary weather provider with a key-less fallback.
///
/// Never fails past this boundary: any provider error becomes `None` after logging.
pub struct WeatherResolver<P, S> {
    primary: P,
    secondary: S,
}

impl<P: WeatherProvider, S: WeatherProvider> WeatherResolver<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub async fn resolve(&self, center: Coordinate) -> Option<WeatherReading> {
        match self.primary.current(center).await {
            Ok(reading) => return Some(reading),
            Err(err) => report_failure("primary weather", &err),
        }

        log_info!("falling back to secondary weather provider");
        match self.secondary.current(center).await {
            Ok(reading) => Some(reading),
            Err(err) => {
                report_failure("secondary weather", &err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherSource;
    use crate::testing::FakeWeather;

    fn here() -> Coordinate {
        Coordinate::new(47.61, -122.33)
    }

    #[tokio::test]
    async fn primary_wins_when_available() {
        let secondary = FakeWeather::answering(9.0, "Partly cloudy", WeatherSource::Secondary);
        let resolver = WeatherResolver::new(
            FakeWeather::answering(14.0, "Clear", WeatherSource::Primary),
            secondary.clone(),
        );

        let reading = resolver.resolve(here()).await.unwrap();
        assert_eq!(reading.source, WeatherSource::Primary);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn falls_back_on_primary_failure() {
        let resolver = WeatherResolver::new(
            FakeWeather::unavailable(),
            FakeWeather::answering(9.0, "Partly cloudy", WeatherSource::Secondary),
        );

        let reading = resolver.resolve(here()).await.unwrap();
        assert_eq!(reading.condition, "Partly cloudy");
        assert_eq!(reading.source, WeatherSource::Secondary);
    }

    #[tokio::test]
    async fn both_failing_is_none() {
        let resolver = WeatherResolver::new(FakeWeather::unavailable(), FakeWeather::failing());
        assert!(resolver.resolve(here()).await.is_none());
    }
}
