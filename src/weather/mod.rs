pub mod codes;
pub mod resolver;

pub use resolver::WeatherResolver;
