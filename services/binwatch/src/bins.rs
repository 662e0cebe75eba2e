//! Bin queries and lifecycle operations

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;

use crate::error::{ApiError, StoreContext};
use crate::models::{Bin, BinDetails, BinLocations, BinMarker, BinStatus, ReadingPoint, Sensor};

/// Display prefix of every generated identifier, e.g. "Bin 007"
pub const IDENTIFIER_PREFIX: &str = "Bin ";

/// Sensors every new bin starts with, in insertion order
pub const DEFAULT_SENSORS: [&str; 4] = [
    "Particulate Matter (PM2.5/PM10)",
    "Carbon Monoxide (CO)",
    "Carbon Dioxide (CO2)",
    "Total Volatile Organic Compounds (TVOC)",
];

/// Number of recent readings returned per sensor
pub const RECENT_READINGS: i64 = 6;

const BIN_COLUMNS: &str = "id, bin_identifier, location, status, last_maintenance, air_quality_status";

/// Bin columns the operator may edit through `update_bin_detail`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    Location,
    LastMaintenance,
}

impl EditableField {
    /// Resolve the label shown in the detail view
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Location" => Some(EditableField::Location),
            "Last Maintenance" => Some(EditableField::LastMaintenance),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EditableField::Location => "Location",
            EditableField::LastMaintenance => "Last Maintenance",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            EditableField::Location => "location",
            EditableField::LastMaintenance => "last_maintenance",
        }
    }
}

/// New value for an editable field, already validated for its column
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
}

/// Format the identifier for a sequence number
pub fn format_identifier(number: i64) -> String {
    format!("{}{:03}", IDENTIFIER_PREFIX, number)
}

pub async fn list_active(conn: &mut SqliteConnection) -> Result<Vec<Bin>, ApiError> {
    sqlx::query_as::<_, Bin>(&format!(
        "SELECT {BIN_COLUMNS} FROM bins WHERE status = ? ORDER BY bin_identifier ASC"
    ))
    .bind(BinStatus::Active)
    .fetch_all(&mut *conn)
    .await
    .store_context("Error fetching bins")
}

/// Deleted bins, most recently changed first
pub async fn list_deleted(conn: &mut SqliteConnection) -> Result<Vec<Bin>, ApiError> {
    sqlx::query_as::<_, Bin>(&format!(
        "SELECT {BIN_COLUMNS} FROM bins WHERE status = ? ORDER BY updated_at DESC, id DESC"
    ))
    .bind(BinStatus::Deleted)
    .fetch_all(&mut *conn)
    .await
    .store_context("Error fetching deleted bins")
}

pub async fn find(conn: &mut SqliteConnection, bin_id: i64) -> Result<Option<Bin>, ApiError> {
    sqlx::query_as::<_, Bin>(&format!("SELECT {BIN_COLUMNS} FROM bins WHERE id = ?"))
        .bind(bin_id)
        .fetch_optional(&mut *conn)
        .await
        .store_context("Error fetching bin")
}

/// Bin row, its sensors by name, and each sensor's recent readings oldest first
pub async fn details(conn: &mut SqliteConnection, bin_id: i64) -> Result<BinDetails, ApiError> {
    let details = find(conn, bin_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bin not found."))?;

    let sensors = sqlx::query_as::<_, Sensor>(
        "SELECT id, bin_id, sensor_name FROM sensors WHERE bin_id = ? ORDER BY sensor_name, id",
    )
    .bind(bin_id)
    .fetch_all(&mut *conn)
    .await
    .store_context("Error fetching sensors")?;

    let mut readings = BTreeMap::new();
    for sensor in &sensors {
        let mut recent = sqlx::query_as::<_, ReadingPoint>(
            r#"
            SELECT reading_value, reading_timestamp
            FROM sensor_readings
            WHERE sensor_id = ?
            ORDER BY reading_timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(sensor.id)
        .bind(RECENT_READINGS)
        .fetch_all(&mut *conn)
        .await
        .store_context("Error fetching sensor readings")?;
        recent.reverse();
        readings.insert(sensor.id, recent);
    }

    Ok(BinDetails {
        details,
        sensors,
        readings,
    })
}

/// Next sequence number: one past the largest numeric suffix, or 1
pub async fn next_identifier_number(conn: &mut SqliteConnection) -> Result<i64, ApiError> {
    // SUBSTR is 1-based: position 5 is the first character after "Bin ".
    let max: Option<i64> =
        sqlx::query_scalar("SELECT MAX(CAST(SUBSTR(bin_identifier, 5) AS INTEGER)) FROM bins")
            .fetch_one(&mut *conn)
            .await
            .store_context("Error adding bin")?;
    Ok(max.map_or(1, |n| n + 1))
}

/// Insert an active bin with the default sensors.
///
/// The caller must hold the store's write lock (see [`Store::begin`]) so the
/// maximum read here cannot go stale before the insert.
///
/// [`Store::begin`]: crate::store::Store::begin
pub async fn add(conn: &mut SqliteConnection) -> Result<Bin, ApiError> {
    let number = next_identifier_number(conn).await?;
    let now = Utc::now().naive_utc();
    let bin_id = sqlx::query(
        "INSERT INTO bins (bin_identifier, location, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(format_identifier(number))
    .bind(default_location(number))
    .bind(BinStatus::Active)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .store_context("Error adding bin")?
    .last_insert_rowid();

    for sensor_name in DEFAULT_SENSORS {
        sqlx::query("INSERT INTO sensors (bin_id, sensor_name) VALUES (?, ?)")
            .bind(bin_id)
            .bind(sensor_name)
            .execute(&mut *conn)
            .await
            .store_context("Error adding default sensors")?;
    }

    tracing::info!("Added {} (id {})", format_identifier(number), bin_id);
    Ok(Bin {
        id: bin_id,
        bin_identifier: format_identifier(number),
        location: default_location(number),
        status: BinStatus::Active,
        last_maintenance: None,
        air_quality_status: None,
    })
}

fn default_location(number: i64) -> String {
    format!("New Location {}", number)
}

/// Soft-delete an active bin. Returns whether a row changed.
pub async fn soft_delete(conn: &mut SqliteConnection, bin_id: i64) -> Result<bool, ApiError> {
    let result = sqlx::query("UPDATE bins SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(BinStatus::Deleted)
        .bind(Utc::now().naive_utc())
        .bind(bin_id)
        .bind(BinStatus::Active)
        .execute(&mut *conn)
        .await
        .store_context("Error deleting bin")?;
    Ok(result.rows_affected() > 0)
}

/// Reactivate a deleted bin.
///
/// Returns the row as it was before the update with its status set to
/// Active, or `None` when the update itself matched nothing.
pub async fn recover(conn: &mut SqliteConnection, bin_id: i64) -> Result<Option<Bin>, ApiError> {
    let before = sqlx::query_as::<_, Bin>(&format!(
        "SELECT {BIN_COLUMNS} FROM bins WHERE id = ? AND status = ?"
    ))
    .bind(bin_id)
    .bind(BinStatus::Deleted)
    .fetch_optional(&mut *conn)
    .await
    .store_context("Error recovering bin")?
    .ok_or_else(|| ApiError::not_found("Deleted bin not found."))?;

    let result = sqlx::query("UPDATE bins SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(BinStatus::Active)
        .bind(Utc::now().naive_utc())
        .bind(bin_id)
        .bind(BinStatus::Deleted)
        .execute(&mut *conn)
        .await
        .store_context("Error recovering bin")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(Bin {
        status: BinStatus::Active,
        ..before
    }))
}

/// Update one allow-listed column
pub async fn update_field(
    conn: &mut SqliteConnection,
    bin_id: i64,
    field: EditableField,
    value: &FieldValue,
) -> Result<(), ApiError> {
    // Column names come from the closed EditableField set, never from input.
    let sql = format!(
        "UPDATE bins SET {} = ?, updated_at = ? WHERE id = ?",
        field.column()
    );
    let query = match value {
        FieldValue::Text(text) => sqlx::query(&sql).bind(text.clone()),
        FieldValue::Date(date) => sqlx::query(&sql).bind(*date),
    };
    let result = query
        .bind(Utc::now().naive_utc())
        .bind(bin_id)
        .execute(&mut *conn)
        .await
        .store_context("Error updating bin")?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Bin not found."));
    }
    tracing::debug!("Bin {} {} updated", bin_id, field.label());
    Ok(())
}

/// Active bins whose location has a known coordinate
pub async fn locate(
    conn: &mut SqliteConnection,
    center: [f64; 2],
    coordinates: &BTreeMap<String, [f64; 2]>,
) -> Result<BinLocations, ApiError> {
    let markers = list_active(conn)
        .await?
        .into_iter()
        .filter_map(|bin| {
            let [latitude, longitude] = *coordinates.get(&bin.location)?;
            Some(BinMarker {
                id: bin.id,
                bin_identifier: bin.bin_identifier,
                location: bin.location,
                latitude,
                longitude,
            })
        })
        .collect();

    Ok(BinLocations { center, markers })
}
