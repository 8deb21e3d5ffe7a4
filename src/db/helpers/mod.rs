use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::Record;

/// Fixed-width RFC 3339 so timestamps sort lexicographically in SQLite.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn encode_record(record: &Record) -> Result<String> {
    serde_json::to_string(record).with_context(|| format!("failed to serialize record {}", record.id))
}

pub fn decode_record(payload: &str) -> Result<Record> {
    serde_json::from_str(payload).context("failed to parse stored record")
}
