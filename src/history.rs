//! Full-history bulk fetch.
//!
//! One query per metric kind runs concurrently on a `JoinSet`. Each query has its own hard
//! timeout; a kind that times out or fails is dropped from the report and the others carry on.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::db::Database;
use crate::models::Vitals;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const DEFAULT_KIND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    Systolic,
    Diastolic,
    Pulse,
    OxygenSaturation,
    BodyTemperature,
    RespiratoryRate,
    HeartRateVariability,
    RestingHeartRate,
    WalkingHeartRate,
}

impl MetricKind {
    pub const ALL: [MetricKind; 9] = [
        MetricKind::Systolic,
        MetricKind::Diastolic,
        MetricKind::Pulse,
        MetricKind::OxygenSaturation,
        MetricKind::BodyTemperature,
        MetricKind::RespiratoryRate,
        MetricKind::HeartRateVariability,
        MetricKind::RestingHeartRate,
        MetricKind::WalkingHeartRate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Systolic => "systolic",
            MetricKind::Diastolic => "diastolic",
            MetricKind::Pulse => "pulse",
            MetricKind::OxygenSaturation => "oxygen saturation",
            MetricKind::BodyTemperature => "body temperature",
            MetricKind::RespiratoryRate => "respiratory rate",
            MetricKind::HeartRateVariability => "heart rate variability",
            MetricKind::RestingHeartRate => "resting heart rate",
            MetricKind::WalkingHeartRate => "walking heart rate",
        }
    }

    pub fn value(&self, vitals: &Vitals) -> Option<f64> {
        match self {
            MetricKind::Systolic => vitals.systolic,
            MetricKind::Diastolic => vitals.diastolic,
            MetricKind::Pulse => vitals.pulse,
            MetricKind::OxygenSaturation => vitals.oxygen_saturation,
            MetricKind::BodyTemperature => vitals.body_temperature_c,
            MetricKind::RespiratoryRate => vitals.respiratory_rate,
            MetricKind::HeartRateVariability => vitals.heart_rate_variability_ms,
            MetricKind::RestingHeartRate => vitals.resting_heart_rate,
            MetricKind::WalkingHeartRate => vitals.walking_heart_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// A source of timestamped samples, queried one metric kind at a time.
pub trait MetricHistory: Send + Sync + 'static {
    fn samples(&self, kind: MetricKind) -> impl Future<Output = Result<Vec<Sample>>> + Send;
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub series: BTreeMap<MetricKind, Vec<Sample>>,
    /// Kinds that timed out or failed this run, ascending.
    pub unavailable: Vec<MetricKind>,
}

pub async fn collect_history<S: MetricHistory>(
    source: Arc<S>,
    kinds: &[MetricKind],
    per_kind_timeout: Duration,
) -> HistoryReport {
    let mut tasks = JoinSet::new();
    for &kind in kinds {
        let source = Arc::clone(&source);
        tasks.spawn(async move {
            let outcome = timeout(per_kind_timeout, source.samples(kind)).await;
            (kind, outcome)
        });
    }

    let mut report = HistoryReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((kind, Ok(Ok(samples)))) => {
                report.series.insert(kind, samples);
            }
            Ok((kind, Ok(Err(err)))) => {
                log_warn!("{} history unavailable: {err:#}", kind.label());
                report.unavailable.push(kind);
            }
            Ok((kind, Err(_))) => {
                log_warn!("{} history abandoned after {:?}", kind.label(), per_kind_timeout);
                report.unavailable.push(kind);
            }
            Err(join_err) => {
                log_error!("history task failed: {join_err}");
            }
        }
    }

    report.unavailable.sort();
    log_info!(
        "history collected: {} series, {} unavailable",
        report.series.len(),
        report.unavailable.len()
    );
    report
}

/// Samples drawn from the record log, optionally limited to records at or after `since`.
#[derive(Clone)]
pub struct RecordHistory {
    db: Database,
    since: Option<DateTime<Utc>>,
}

impl RecordHistory {
    pub fn new(db: Database, since: Option<DateTime<Utc>>) -> Self {
        Self { db, since }
    }
}

impl MetricHistory for RecordHistory {
    fn samples(&self, kind: MetricKind) -> impl Future<Output = Result<Vec<Sample>>> + Send {
        let db = self.db.clone();
        let since = self.since;
        async move {
            let records = match since {
                Some(since) => db.load_records_since(since).await?,
                None => db.load_records().await?,
            };

            let mut samples: Vec<Sample> = records
                .iter()
                .filter_map(|record| {
                    kind.value(&record.vitals).map(|value| Sample {
                        at: record.timestamp,
                        value,
                    })
                })
                .collect();
            samples.sort_by_key(|sample| sample.at);
            Ok(samples)
        }
    }
}
