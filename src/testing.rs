//! In-memory provider fakes shared by unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{
    AirQualityReading, AirQualitySource, BoundingBox, Coordinate, WeatherReading, WeatherSource,
};
use crate::providers::{
    AirIndexProvider, Cell, ProviderError, SensorDetail, SensorNetwork, SensorTable,
    WeatherProvider,
};

#[derive(Debug, Clone, Copy)]
enum Failure {
    Unconfigured,
    Transport,
}

fn fail(failure: Failure) -> ProviderError {
    match failure {
        Failure::Unconfigured => ProviderError::NotConfigured("fake"),
        Failure::Transport => ProviderError::Status {
            provider: "fake",
            status: 503,
        },
    }
}

#[derive(Clone)]
pub struct FakeWeather {
    answer: Result<WeatherReading, Failure>,
    calls: Arc<AtomicUsize>,
}

impl FakeWeather {
    pub fn answering(temperature_c: f64, condition: &str, source: WeatherSource) -> Self {
        Self {
            answer: Ok(WeatherReading {
                temperature_c,
                condition: condition.to_string(),
                source,
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            answer: Err(Failure::Unconfigured),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: Err(Failure::Transport),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WeatherProvider for FakeWeather {
    async fn current(&self, _at: Coordinate) -> Result<WeatherReading, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(fail)
    }
}

#[derive(Clone)]
pub struct FakeAirIndex {
    answer: Option<AirQualityReading>,
    calls: Arc<AtomicUsize>,
}

impl FakeAirIndex {
    pub fn answering(aqi: f64, pm2_5: f64) -> Self {
        Self {
            answer: Some(AirQualityReading {
                aqi,
                pm2_5,
                pm10: None,
                source: AirQualitySource::CommunityIndex,
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AirIndexProvider for FakeAirIndex {
    async fn air_quality(&self, _at: Coordinate) -> Result<AirQualityReading, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().ok_or_else(|| fail(Failure::Transport))
    }
}

/// Sensor network backed by a fixed search table and per-id detail maps.
#[derive(Clone, Default)]
pub struct FakeNetwork {
    table: Option<SensorTable>,
    details: BTreeMap<u64, SensorDetail>,
    searches: Arc<AtomicUsize>,
    detail_requests: Arc<std::sync::Mutex<Vec<u64>>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: SensorTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_detail(mut self, sensor_id: u64, detail: SensorDetail) -> Self {
        self.details.insert(sensor_id, detail);
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn detail_requests(&self) -> Vec<u64> {
        self.detail_requests
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

impl SensorNetwork for FakeNetwork {
    async fn search(&self, _area: BoundingBox) -> Result<SensorTable, ProviderError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.table.clone().ok_or_else(|| fail(Failure::Transport))
    }

    async fn sensor_detail(&self, sensor_id: u64) -> Result<SensorDetail, ProviderError> {
        if let Ok(mut ids) = self.detail_requests.lock() {
            ids.push(sensor_id);
        }
        self.details
            .get(&sensor_id)
            .cloned()
            .ok_or_else(|| fail(Failure::Transport))
    }
}

pub const SEARCH_COLUMNS: [&str; 6] = [
    "sensor_index",
    "name",
    "latitude",
    "longitude",
    "location_type",
    "last_seen",
];

/// One search row in `SEARCH_COLUMNS` order.
pub fn sensor_row(
    id: i64,
    latitude: f64,
    longitude: f64,
    outdoor: bool,
    last_seen: DateTime<Utc>,
) -> Vec<Cell> {
    vec![
        Cell::Int(id),
        Cell::Text(format!("sensor {id}")),
        Cell::Float(latitude),
        Cell::Float(longitude),
        Cell::Int(if outdoor { 0 } else { 1 }),
        Cell::Int(last_seen.timestamp()),
    ]
}

pub fn table(rows: Vec<Vec<Cell>>) -> SensorTable {
    SensorTable {
        fields: SEARCH_COLUMNS.iter().map(|c| c.to_string()).collect(),
        data: rows,
    }
}

pub fn detail(fields: &[(&str, f64)], stats: &[(&str, f64)]) -> SensorDetail {
    SensorDetail {
        fields: float_cells(fields),
        stats: float_cells(stats),
    }
}

fn float_cells(pairs: &[(&str, f64)]) -> BTreeMap<String, Cell> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), Cell::Float(*value)))
        .collect()
}

/// Request heads seen by a loopback server, lowercased, in arrival order.
#[derive(Clone, Default)]
pub struct RequestLog(Arc<std::sync::Mutex<Vec<String>>>);

impl RequestLog {
    fn push(&self, head: String) {
        if let Ok(mut heads) = self.0.lock() {
            heads.push(head);
        }
    }

    pub fn heads(&self) -> Vec<String> {
        self.0.lock().map(|heads| heads.clone()).unwrap_or_default()
    }

    /// Request targets (`/path?query`) in arrival order.
    pub fn targets(&self) -> Vec<String> {
        self.heads()
            .iter()
            .filter_map(|head| head.lines().next())
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(str::to_string)
            .collect()
    }
}

/// One canned answer; a `path` of `*` matches any request.
pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

fn pick_route<'a>(routes: &'a [Route], target: &str) -> Option<&'a Route> {
    let path = target.split('?').next().unwrap_or(target);
    routes
        .iter()
        .find(|route| route.path == path || route.path == "*")
}

/// Serves `routes` on a loopback port, recording every request head. Unmatched paths get 404.
pub async fn serve_routes(routes: Vec<Route>) -> (String, RequestLog) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);
    let log = RequestLog::default();
    let server_log = log.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = Arc::clone(&routes);
            let log = server_log.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&request).to_lowercase();
                let target = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                log.push(head);

                let (status, body) = match pick_route(&routes, &target) {
                    Some(route) => (route.status, route.body.clone()),
                    None => (404, r#"{"error": "not found"}"#.to_string()),
                };
                let response = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), log)
}

/// Serves `body` with `status` to every request and returns the base URL.
pub async fn serve_json(status: u16, body: String) -> String {
    serve_routes(vec![Route {
        path: "*",
        status,
        body,
    }])
    .await
    .0
}
