pub mod coordinate;
pub mod reading;
pub mod record;
pub mod sensor;

pub use coordinate::{BoundingBox, Coordinate};
pub use reading::{AirQualityReading, AirQualitySource, WeatherReading, WeatherSource};
pub use record::{Record, RecordAir, RecordWeather, Symptom, Vitals};
pub use sensor::{PollutantWindows, Sensor};
