pub mod config;
pub mod hourly;
pub mod scoring;

pub use config::{AggregationConfig, CompletenessWeights};
pub use hourly::{aggregate, aggregate_hourly};
pub use scoring::{completeness_score, score};
