use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::Record;

use super::config::AggregationConfig;
use super::scoring::completeness_score;

const SECS_PER_HOUR: i64 = 3600;

/// Hour index of `timestamp` on the configured fixed-offset clock.
pub fn hour_bucket(timestamp: DateTime<Utc>, config: &AggregationConfig) -> i64 {
    let offset = i64::from(config.offset().local_minus_utc());
    (timestamp.timestamp() + offset).div_euclid(SECS_PER_HOUR)
}

/// Score, then timestamp, then id. Greatest wins.
fn rank(a: &(u32, &Record), b: &(u32, &Record)) -> Ordering {
    a.0.cmp(&b.0)
        .then_with(|| a.1.timestamp.cmp(&b.1.timestamp))
        .then_with(|| a.1.id.cmp(&b.1.id))
}

/// Picks the most complete record of one bucket.
fn select_representative<'a>(bucket: &[&'a Record], config: &AggregationConfig) -> Option<&'a Record> {
    if let [only] = bucket {
        return Some(*only);
    }

    bucket
        .iter()
        .map(|record| (completeness_score(record, &config.weights), *record))
        .max_by(rank)
        .map(|(_, record)| record)
}

/// Reduces a record sequence to one record per distinct hour, ascending by timestamp.
///
/// Within an hour the highest completeness score wins; ties go to the latest timestamp, then
/// to the greatest id, so the result depends only on the input multiset.
pub fn aggregate_hourly(records: &[Record], config: &AggregationConfig) -> Vec<Record> {
    let mut buckets: BTreeMap<i64, Vec<&Record>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(hour_bucket(record.timestamp, config))
            .or_default()
            .push(record);
    }

    let mut result: Vec<Record> = buckets
        .values()
        .filter_map(|bucket| select_representative(bucket, config))
        .cloned()
        .collect();

    result.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    result
}

/// Hourly reduction on UTC hours with the default weights.
pub fn aggregate(records: &[Record]) -> Vec<Record> {
    aggregate_hourly(records, &AggregationConfig::default())
}
