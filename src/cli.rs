//! Command-line front end over the record log and the snapshot pipeline.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::aggregation::aggregate_hourly;
use crate::air_quality::locate;
use crate::aqi::AqiCategory;
use crate::history::{collect_history, MetricKind, RecordHistory};
use crate::models::{Coordinate, Symptom, Vitals};
use crate::refresh::RefreshRequest;
use crate::snapshot::Snapshot;
use crate::AppState;

/// Log vitals alongside local weather and air quality
#[derive(Debug, Parser)]
#[command(name = "airvitals")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the record log and settings
    #[arg(long, global = true, default_value = "./airvitals-data")]
    data_dir: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch current weather and air quality without recording
    Snapshot(Location),

    /// Take a snapshot and append a record with the given vitals
    Record(RecordArgs),

    /// List fresh outdoor sensors near a location, nearest first
    Sensors(Location),

    /// Print one representative record per hour
    Hourly,

    /// Print the full record log in insertion order
    List,

    /// Remove a record by id
    Delete { id: String },

    /// Per-metric vitals history from the record log
    History(HistoryArgs),

    /// Pin a sensor for air quality, or clear the pin
    PreferSensor {
        sensor_id: Option<u64>,
        #[arg(long, conflicts_with = "sensor_id")]
        clear: bool,
    },
}

#[derive(Debug, Args)]
struct Location {
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

impl Location {
    fn coordinate(&self) -> Result<Coordinate> {
        let coordinate = Coordinate::new(self.lat, self.lon);
        if !coordinate.is_valid() {
            bail!("invalid coordinate {},{}", self.lat, self.lon);
        }
        Ok(coordinate)
    }
}

#[derive(Debug, Args)]
struct RecordArgs {
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,
    #[arg(long)]
    systolic: Option<f64>,
    #[arg(long)]
    diastolic: Option<f64>,
    #[arg(long)]
    pulse: Option<f64>,
    #[arg(long)]
    spo2: Option<f64>,
    #[arg(long)]
    body_temp: Option<f64>,
    #[arg(long)]
    resp_rate: Option<f64>,
    #[arg(long)]
    hrv: Option<f64>,
    #[arg(long)]
    resting_hr: Option<f64>,
    #[arg(long)]
    walking_hr: Option<f64>,
    #[arg(long, default_value = "")]
    note: String,
    /// Repeatable; unknown names are kept as free text
    #[arg(long = "symptom")]
    symptoms: Vec<String>,
}

impl RecordArgs {
    fn into_request(self, preferred_sensor_id: Option<u64>) -> Result<RefreshRequest> {
        let coordinate = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Location { lat, lon }.coordinate()?),
            _ => None,
        };
        let symptoms: BTreeSet<Symptom> =
            self.symptoms.iter().filter_map(|s| Symptom::parse(s)).collect();

        Ok(RefreshRequest {
            coordinate,
            vitals: Vitals {
                systolic: self.systolic,
                diastolic: self.diastolic,
                pulse: self.pulse,
                oxygen_saturation: self.spo2,
                body_temperature_c: self.body_temp,
                respiratory_rate: self.resp_rate,
                heart_rate_variability_ms: self.hrv,
                resting_heart_rate: self.resting_hr,
                walking_heart_rate: self.walking_hr,
            },
            note: self.note,
            symptoms,
            preferred_sensor_id,
        })
    }
}

#[derive(Debug, Args)]
struct HistoryArgs {
    /// Only records from the last N days
    #[arg(long)]
    days: Option<i64>,
    /// Metric kinds to fetch; all when omitted
    #[arg(long = "kind", value_enum)]
    kinds: Vec<MetricKind>,
}

fn days_ago(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| anyhow!("--days {days} is out of range"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe(snapshot: &Snapshot) {
    if let Some(weather) = &snapshot.weather {
        println!("Weather: {:.1} °C, {}", weather.temperature_c, weather.condition);
    }
    if let Some(air) = &snapshot.air {
        println!(
            "Air: AQI {:.0} ({}), PM2.5 {:.1} µg/m³",
            air.aqi,
            AqiCategory::from_index(air.aqi).label(),
            air.pm2_5
        );
    }
    println!("{}", snapshot.status_message());
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let state = AppState::open(&self.data_dir)?;

        match self.command {
            Command::Snapshot(location) => {
                let settings = state.settings.effective()?;
                let center = location.coordinate()?;
                let snapshot = state
                    .refresh
                    .builder()
                    .build(center, settings.preferred_sensor_id)
                    .await;
                describe(&snapshot);
                if snapshot.status().is_actionable_error() {
                    bail!("{}", snapshot.status_message());
                }
                Ok(())
            }
            Command::Record(args) => {
                let settings = state.settings.effective()?;
                let request = args.into_request(settings.preferred_sensor_id)?;
                let outcome = state.refresh.refresh(request).await?;
                if let Some(snapshot) = &outcome.snapshot {
                    describe(snapshot);
                }
                println!("Recorded {}", outcome.record.id);
                Ok(())
            }
            Command::Sensors(location) => {
                let settings = state.settings.effective()?;
                let center = location.coordinate()?;
                let network = state.refresh.builder().air_resolver().network();
                let sensors = locate(network, center, &settings.locator()).await?;
                if sensors.is_empty() {
                    println!("No fresh outdoor sensors within {}°", settings.search_radius_deg);
                    return Ok(());
                }
                for sensor in sensors {
                    println!(
                        "{:>8}  {:>6.2} km  {}",
                        sensor.id,
                        sensor.distance_km.unwrap_or_default(),
                        sensor.name
                    );
                }
                Ok(())
            }
            Command::Hourly => {
                let settings = state.settings.effective()?;
                let records = state.db.load_records().await?;
                print_json(&aggregate_hourly(&records, &settings.aggregation()))
            }
            Command::List => print_json(&state.db.load_records().await?),
            Command::Delete { id } => {
                if !state.db.delete_record(&id).await? {
                    bail!("no record with id {id}");
                }
                println!("Deleted {id}");
                Ok(())
            }
            Command::History(args) => {
                let settings = state.settings.effective()?;
                let since = args.days.map(|days| days_ago(Utc::now(), days)).transpose()?;
                let kinds = if args.kinds.is_empty() {
                    MetricKind::ALL.to_vec()
                } else {
                    args.kinds
                };
                let source = Arc::new(RecordHistory::new(state.db.clone(), since));
                let report = collect_history(source, &kinds, settings.history_timeout()).await;
                print_json(&report)
            }
            Command::PreferSensor { sensor_id, clear } => {
                if sensor_id.is_none() && !clear {
                    let current = state.settings.stored()?.preferred_sensor_id;
                    match current {
                        Some(id) => println!("Preferred sensor: {id}"),
                        None => println!("No preferred sensor; nearest is used"),
                    }
                    return Ok(());
                }
                state.settings.set_preferred_sensor(sensor_id)?;
                match sensor_id {
                    Some(id) => println!("Preferred sensor set to {id}"),
                    None => println!("Preferred sensor cleared"),
                }
                Ok(())
            }
        }
    }
}
