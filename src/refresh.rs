//! User-triggered refresh: snapshot, compose a record, append it, publish it.
//!
//! Overlapping refreshes are never cancelled. Each one takes a generation number when it
//! starts and only the highest generation seen so far is published as latest.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{Coordinate, Record, RecordAir, RecordWeather, Symptom, Vitals};
use crate::providers::{AirIndexProvider, SensorNetwork, WeatherProvider};
use crate::snapshot::{Snapshot, SnapshotBuilder};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Default)]
pub struct RefreshRequest {
    /// Without a coordinate no snapshot is taken; the record still carries vitals and note.
    pub coordinate: Option<Coordinate>,
    pub vitals: Vitals,
    pub note: String,
    pub symptoms: BTreeSet<Symptom>,
    pub preferred_sensor_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub generation: u64,
    pub record: Record,
    pub snapshot: Option<Snapshot>,
}

fn compose_record(request: RefreshRequest, snapshot: Option<&Snapshot>) -> Record {
    let timestamp = snapshot.map(|s| s.taken_at).unwrap_or_else(Utc::now);
    let mut record = Record::new(timestamp);
    record.vitals = request.vitals;
    record.note = request.note;
    record.symptoms = request.symptoms;
    record.coordinate = request.coordinate;

    if let Some(snapshot) = snapshot {
        record.weather = snapshot.weather.as_ref().map(RecordWeather::from).unwrap_or_default();
        record.air = snapshot.air.as_ref().map(RecordAir::from).unwrap_or_default();
    }
    record
}

pub struct RefreshController<WP, WS, N, A> {
    builder: Arc<SnapshotBuilder<WP, WS, N, A>>,
    db: Database,
    generation: Arc<AtomicU64>,
    latest: Arc<Mutex<Option<RefreshOutcome>>>,
}

impl<WP, WS, N, A> Clone for RefreshController<WP, WS, N, A> {
    fn clone(&self) -> Self {
        Self {
            builder: Arc::clone(&self.builder),
            db: self.db.clone(),
            generation: Arc::clone(&self.generation),
            latest: Arc::clone(&self.latest),
        }
    }
}

impl<WP, WS, N, A> RefreshController<WP, WS, N, A>
where
    WP: WeatherProvider,
    WS: WeatherProvider,
    N: SensorNetwork,
    A: AirIndexProvider,
{
    pub fn new(builder: SnapshotBuilder<WP, WS, N, A>, db: Database) -> Self {
        Self {
            builder: Arc::new(builder),
            db,
            generation: Arc::new(AtomicU64::new(0)),
            latest: Arc::new(Mutex::new(None)),
        }
    }

    pub fn builder(&self) -> &SnapshotBuilder<WP, WS, N, A> {
        &self.builder
    }

    /// The newest published refresh, if any has finished.
    pub async fn latest(&self) -> Option<RefreshOutcome> {
        self.latest.lock().await.clone()
    }

    /// Runs one refresh to completion. The record is appended even when a newer refresh has
    /// already been published; only the published "latest" is last-write-wins.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<RefreshOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let snapshot = match request.coordinate {
            Some(center) => Some(self.builder.build(center, request.preferred_sensor_id).await),
            None => {
                log_info!("no coordinate for refresh {generation}, skipping snapshot");
                None
            }
        };

        let record = compose_record(request, snapshot.as_ref());
        self.db.append_record(&record).await?;

        let outcome = RefreshOutcome {
            generation,
            record,
            snapshot,
        };
        self.publish(outcome.clone()).await;
        Ok(outcome)
    }

    async fn publish(&self, outcome: RefreshOutcome) -> bool {
        let mut latest = self.latest.lock().await;
        let newer = latest
            .as_ref()
            .map_or(true, |current| outcome.generation > current.generation);
        if newer {
            *latest = Some(outcome);
        } else {
            log_debug!("refresh {} superseded, not published", outcome.generation);
        }
        newer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::air_quality::{AirQualityResolver, LocatorConfig};
    use crate::models::WeatherSource;
    use crate::snapshot::SnapshotStatus;
    use crate::testing::{FakeAirIndex, FakeNetwork, FakeWeather};
    use crate::weather::WeatherResolver;

    type Controller = RefreshController<FakeWeather, FakeWeather, FakeNetwork, FakeAirIndex>;

    fn controller(db: Database) -> Controller {
        let builder = SnapshotBuilder::new(
            WeatherResolver::new(
                FakeWeather::answering(18.5, "Clear sky", WeatherSource::Primary),
                FakeWeather::failing(),
            ),
            AirQualityResolver::new(FakeNetwork::new(), LocatorConfig::default()),
            FakeAirIndex::answering(57.0, 15.2),
        );
        RefreshController::new(builder, db)
    }

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("records.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn refresh_appends_and_publishes() {
        let (_dir, db) = open();
        let controller = controller(db.clone());

        let mut request = RefreshRequest {
            coordinate: Some(Coordinate::new(47.6, -122.3)),
            note: "after run".into(),
            ..Default::default()
        };
        request.vitals.pulse = Some(88.0);
        request.symptoms.insert(Symptom::Wheezing);

        let outcome = controller.refresh(request).await.unwrap();
        assert_eq!(outcome.generation, 1);
        assert_eq!(outcome.snapshot.as_ref().unwrap().status(), SnapshotStatus::Complete);
        assert_eq!(outcome.record.weather.condition.as_deref(), Some("Clear sky"));
        assert_eq!(outcome.record.air.aqi, Some(57.0));
        assert_eq!(outcome.record.vitals.pulse, Some(88.0));

        assert_eq!(db.load_records().await.unwrap(), vec![outcome.record.clone()]);
        assert_eq!(controller.latest().await.unwrap().record, outcome.record);
    }

    #[tokio::test]
    async fn missing_coordinate_still_records_vitals() {
        let (_dir, db) = open();
        let controller = controller(db);

        let mut request = RefreshRequest::default();
        request.vitals.systolic = Some(120.0);

        let outcome = controller.refresh(request).await.unwrap();
        assert!(outcome.snapshot.is_none());
        assert_eq!(outcome.record.weather, RecordWeather::default());
        assert_eq!(outcome.record.coordinate, None);
    }

    #[tokio::test]
    async fn overlapping_refreshes_all_land_in_the_log() {
        let (_dir, db) = open();
        let controller = controller(db.clone());
        let request = RefreshRequest {
            coordinate: Some(Coordinate::new(40.0, -74.0)),
            ..Default::default()
        };

        let (a, b) = tokio::join!(controller.refresh(request.clone()), controller.refresh(request));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(db.load_records().await.unwrap().len(), 2);
        let newest = a.generation.max(b.generation);
        assert_eq!(controller.latest().await.unwrap().generation, newest);
    }

    #[tokio::test]
    async fn older_generation_never_replaces_newer() {
        let (_dir, db) = open();
        let controller = controller(db);

        let outcome = |generation| RefreshOutcome {
            generation,
            record: Record::new(Utc::now()),
            snapshot: None,
        };

        assert!(controller.publish(outcome(2)).await);
        assert!(!controller.publish(outcome(1)).await);
        assert_eq!(controller.latest().await.unwrap().generation, 2);
        assert!(controller.publish(outcome(3)).await);
    }
}
