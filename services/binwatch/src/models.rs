//! Row types shared by the store and the JSON envelope

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Lifecycle status of a bin. Bins are never hard-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
pub enum BinStatus {
    Active,
    Deleted,
}

/// A monitored receptacle
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Bin {
    pub id: i64,
    pub bin_identifier: String,
    pub location: String,
    pub status: BinStatus,
    pub last_maintenance: Option<NaiveDate>,
    pub air_quality_status: Option<String>,
}

/// A named measurement channel attached to one bin
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Sensor {
    pub id: i64,
    pub bin_id: i64,
    pub sensor_name: String,
}

/// One timestamped sample, as returned for charting
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ReadingPoint {
    pub reading_value: f64,
    pub reading_timestamp: NaiveDateTime,
}

/// Everything the detail view needs for one bin
#[derive(Debug, Clone, Serialize)]
pub struct BinDetails {
    pub details: Bin,
    pub sensors: Vec<Sensor>,
    /// Keyed by sensor id, oldest reading first
    pub readings: BTreeMap<i64, Vec<ReadingPoint>>,
}

/// An active bin placed on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinMarker {
    pub id: i64,
    pub bin_identifier: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinLocations {
    pub center: [f64; 2],
    pub markers: Vec<BinMarker>,
}
