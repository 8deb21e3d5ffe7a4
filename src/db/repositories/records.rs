use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::{
    helpers::{decode_record, encode_record, format_timestamp},
    Database,
};
use crate::models::Record;

fn insert(conn: &Connection, record: &Record) -> Result<()> {
    conn.execute(
        "INSERT INTO records (id, timestamp, payload) VALUES (?1, ?2, ?3)",
        params![record.id, format_timestamp(&record.timestamp), encode_record(record)?],
    )
    .with_context(|| format!("failed to insert record {}", record.id))?;
    Ok(())
}

fn collect_payloads(conn: &Connection, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Record>> {
    let mut stmt = conn.prepare(sql)?;
    let payloads = stmt.query_map(args, |row| row.get::<_, String>(0))?;

    let mut records = Vec::new();
    for payload in payloads {
        records.push(decode_record(&payload?)?);
    }
    Ok(records)
}

impl Database {
    /// The whole log in insertion order. The returned vector is a private copy, so later
    /// writes never show up in it.
    pub async fn load_records(&self) -> Result<Vec<Record>> {
        self.execute(|conn| collect_payloads(conn, "SELECT payload FROM records ORDER BY seq ASC", &[]))
            .await
    }

    /// Records at or after `since`, in insertion order.
    pub async fn load_records_since(&self, since: DateTime<Utc>) -> Result<Vec<Record>> {
        let since = format_timestamp(&since);
        self.execute(move |conn| {
            collect_payloads(
                conn,
                "SELECT payload FROM records WHERE timestamp >= ?1 ORDER BY seq ASC",
                &[&since],
            )
        })
        .await
    }

    /// Replaces the entire log with `records`, preserving their order.
    pub async fn write_records(&self, records: Vec<Record>) -> Result<()> {
        self.execute(move |conn| {
            let tx = conn.transaction().context("failed to open rewrite transaction")?;
            tx.execute("DELETE FROM records", [])
                .context("failed to clear record log")?;
            for record in &records {
                insert(&tx, record)?;
            }
            tx.commit().context("failed to commit record log")?;
            Ok(())
        })
        .await
    }

    pub async fn append_record(&self, record: &Record) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| insert(conn, &record)).await
    }

    /// Edit by identity. The record keeps its position in the log.
    pub async fn replace_record(&self, record: &Record) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE records SET timestamp = ?1, payload = ?2 WHERE id = ?3",
                    params![format_timestamp(&record.timestamp), encode_record(&record)?, record.id],
                )
                .with_context(|| format!("failed to update record {}", record.id))?;
            if changed == 0 {
                bail!("record {} not found", record.id);
            }
            Ok(())
        })
        .await
    }

    /// Returns whether a record with `id` existed.
    pub async fn delete_record(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.execute(move |conn| {
            let removed = conn
                .execute("DELETE FROM records WHERE id = ?1", params![id])
                .with_context(|| format!("failed to delete record {id}"))?;
            Ok(removed > 0)
        })
        .await
    }
}
