pub mod locator;
pub mod resolver;

pub use locator::{locate, LocatorConfig};
pub use resolver::AirQualityResolver;
