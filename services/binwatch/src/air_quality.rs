//! Air-quality classification of sensor readings and bins

use std::fmt;

use sqlx::SqliteConnection;

use crate::error::{ApiError, StoreContext};

/// Status of one sensor, derived from its latest reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    Safe,
    Bad,
}

/// Overall status of a bin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQuality {
    Good,
    Bad,
}

impl fmt::Display for AirQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AirQuality::Good => write!(f, "Good"),
            AirQuality::Bad => write!(f, "Bad"),
        }
    }
}

/// Readings strictly above the threshold are bad
pub fn classify_reading(value: f64, bad_threshold: f64) -> SensorStatus {
    if value > bad_threshold {
        SensorStatus::Bad
    } else {
        SensorStatus::Safe
    }
}

/// Any bad sensor makes the bin bad; no classified sensor at all means unknown
pub fn overall<I>(statuses: I) -> Option<AirQuality>
where
    I: IntoIterator<Item = SensorStatus>,
{
    let mut any_safe = false;
    for status in statuses {
        match status {
            SensorStatus::Bad => return Some(AirQuality::Bad),
            SensorStatus::Safe => any_safe = true,
        }
    }
    any_safe.then_some(AirQuality::Good)
}

/// Recompute and persist `air_quality_status` for a bin from the latest
/// reading of each of its sensors.
pub async fn refresh_bin(
    conn: &mut SqliteConnection,
    bin_id: i64,
    bad_threshold: f64,
) -> Result<Option<AirQuality>, ApiError> {
    let latest: Vec<f64> = sqlx::query_scalar(
        r#"
        SELECT r.reading_value
        FROM sensors s
        JOIN sensor_readings r ON r.id = (
            SELECT id FROM sensor_readings
            WHERE sensor_id = s.id
            ORDER BY reading_timestamp DESC, id DESC
            LIMIT 1
        )
        WHERE s.bin_id = ?
        "#,
    )
    .bind(bin_id)
    .fetch_all(&mut *conn)
    .await
    .store_context("Error updating air quality")?;

    let quality = overall(
        latest
            .into_iter()
            .map(|value| classify_reading(value, bad_threshold)),
    );

    // Unchanged status leaves updated_at alone; it orders the deleted-bins list.
    let status = quality.map(|q| q.to_string());
    sqlx::query(
        "UPDATE bins SET air_quality_status = ?, updated_at = ? WHERE id = ? AND air_quality_status IS NOT ?",
    )
    .bind(&status)
    .bind(chrono::Utc::now().naive_utc())
    .bind(bin_id)
    .bind(&status)
    .execute(&mut *conn)
    .await
    .store_context("Error updating air quality")?;

    tracing::debug!("Bin {} air quality now {:?}", bin_id, quality);
    Ok(quality)
}
