//! Sensor management and reading history

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::air_quality;
use crate::error::{ApiError, StoreContext};
use crate::models::Sensor;

/// A submitted sensor value. Only numeric values enter the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingValue {
    Numeric(f64),
    NotAvailable,
}

impl ReadingValue {
    /// "N/A", blanks and anything that is not a finite number are not available
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "N/A" {
            return ReadingValue::NotAvailable;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => ReadingValue::Numeric(value),
            _ => ReadingValue::NotAvailable,
        }
    }
}

pub async fn add(
    conn: &mut SqliteConnection,
    bin_id: i64,
    sensor_name: &str,
) -> Result<Sensor, ApiError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM bins WHERE id = ?")
        .bind(bin_id)
        .fetch_optional(&mut *conn)
        .await
        .store_context("Error adding sensor")?;
    if exists.is_none() {
        return Err(ApiError::not_found("Bin not found."));
    }

    let id = sqlx::query("INSERT INTO sensors (bin_id, sensor_name) VALUES (?, ?)")
        .bind(bin_id)
        .bind(sensor_name)
        .execute(&mut *conn)
        .await
        .store_context("Error adding sensor")?
        .last_insert_rowid();

    tracing::debug!("Sensor {} ({}) added to bin {}", id, sensor_name, bin_id);
    Ok(Sensor {
        id,
        bin_id,
        sensor_name: sensor_name.to_string(),
    })
}

/// Hard delete; readings go with the sensor. Deleting an absent sensor is
/// not an error.
pub async fn delete(
    conn: &mut SqliteConnection,
    sensor_id: i64,
    bad_threshold: f64,
) -> Result<(), ApiError> {
    let bin_id = owning_bin(conn, sensor_id).await?;

    sqlx::query("DELETE FROM sensors WHERE id = ?")
        .bind(sensor_id)
        .execute(&mut *conn)
        .await
        .store_context("Error removing sensor")?;

    if let Some(bin_id) = bin_id {
        air_quality::refresh_bin(conn, bin_id, bad_threshold).await?;
    }
    Ok(())
}

/// Append a reading with a server-side timestamp. Returns whether a row was
/// written.
pub async fn record_reading(
    conn: &mut SqliteConnection,
    sensor_id: i64,
    value: ReadingValue,
    bad_threshold: f64,
) -> Result<bool, ApiError> {
    let ReadingValue::Numeric(value) = value else {
        return Ok(false);
    };

    let bin_id = owning_bin(conn, sensor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sensor not found."))?;

    sqlx::query(
        "INSERT INTO sensor_readings (sensor_id, reading_value, reading_timestamp) VALUES (?, ?, ?)",
    )
    .bind(sensor_id)
    .bind(value)
    .bind(Utc::now().naive_utc())
    .execute(&mut *conn)
    .await
    .store_context("Error adding sensor reading")?;

    air_quality::refresh_bin(conn, bin_id, bad_threshold).await?;
    Ok(true)
}

async fn owning_bin(conn: &mut SqliteConnection, sensor_id: i64) -> Result<Option<i64>, ApiError> {
    sqlx::query_scalar("SELECT bin_id FROM sensors WHERE id = ?")
        .bind(sensor_id)
        .fetch_optional(&mut *conn)
        .await
        .store_context("Error looking up sensor")
}
