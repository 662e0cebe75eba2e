//! The closed set of API actions and their typed parameters

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::bins::{self, EditableField, FieldValue};
use crate::contact::{self, ContactSubmission};
use crate::envelope::ActionOutcome;
use crate::error::ApiError;
use crate::sensors::{self, ReadingValue};
use crate::Settings;

/// Flat request parameters, from the query string or a form body
pub type Params = HashMap<String, String>;

/// Parameters of `update_bin_detail`
#[derive(Debug, Clone, PartialEq)]
pub struct DetailUpdate {
    pub bin_id: i64,
    pub field: EditableField,
    pub value: FieldValue,
}

/// Parameters of `add_sensor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSensor {
    pub bin_id: i64,
    pub sensor_name: String,
}

/// Parameters of `update_sensor_reading`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingSubmission {
    pub sensor_id: i64,
    pub value: ReadingValue,
}

/// One API operation, fully validated
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    GetBins,
    GetDeletedBins,
    GetBinDetails { bin_id: i64 },
    GetBinLocations,
    AddBin,
    DeleteBin { bin_id: i64 },
    RecoverBin { bin_id: i64 },
    UpdateBinDetail(DetailUpdate),
    AddSensor(NewSensor),
    DeleteSensor { sensor_id: i64 },
    UpdateSensorReading(ReadingSubmission),
    SubmitContact(ContactSubmission),
}

impl Action {
    /// Parse the `action` parameter and the parameters it needs.
    ///
    /// An unknown action name is a bad request; bad parameters for a known
    /// action are validation failures.
    pub fn from_params(params: &Params) -> Result<Self, ApiError> {
        let name = params.get("action").map(String::as_str).unwrap_or("unknown");
        let action = match name {
            "get_bins" => Action::GetBins,
            "get_deleted_bins" => Action::GetDeletedBins,
            "get_bin_details" => Action::GetBinDetails {
                bin_id: positive_id(params, "bin_id").ok_or_else(invalid_bin_id)?,
            },
            "get_bin_locations" => Action::GetBinLocations,
            "add_bin" => Action::AddBin,
            "delete_bin" => Action::DeleteBin {
                bin_id: positive_id(params, "bin_id").ok_or_else(invalid_bin_id)?,
            },
            "recover_bin" => Action::RecoverBin {
                bin_id: positive_id(params, "bin_id").ok_or_else(invalid_bin_id)?,
            },
            "update_bin_detail" => Action::UpdateBinDetail(detail_update(params)?),
            "add_sensor" => {
                let bin_id = positive_id(params, "bin_id");
                let sensor_name = params.get("sensor_name").map(|s| s.trim()).unwrap_or("");
                match bin_id {
                    Some(bin_id) if !sensor_name.is_empty() => Action::AddSensor(NewSensor {
                        bin_id,
                        sensor_name: sensor_name.to_string(),
                    }),
                    _ => return Err(ApiError::validation("Missing Bin ID or Sensor Name.")),
                }
            }
            "delete_sensor" => Action::DeleteSensor {
                sensor_id: positive_id(params, "sensor_id")
                    .ok_or_else(|| ApiError::validation("Invalid or missing Sensor ID."))?,
            },
            "update_sensor_reading" => {
                match (positive_id(params, "sensor_id"), params.get("value")) {
                    (Some(sensor_id), Some(value)) => {
                        Action::UpdateSensorReading(ReadingSubmission {
                            sensor_id,
                            value: ReadingValue::parse(value),
                        })
                    }
                    _ => return Err(ApiError::validation("Missing Sensor ID or Value.")),
                }
            }
            "submit_contact" => Action::SubmitContact(ContactSubmission::new(
                text(params, "contact_name"),
                text(params, "contact_email"),
                text(params, "contact_message"),
            )?),
            other => {
                return Err(ApiError::BadRequest(format!(
                    "Unknown API action specified: {}",
                    other
                )))
            }
        };
        Ok(action)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::GetBins => "get_bins",
            Action::GetDeletedBins => "get_deleted_bins",
            Action::GetBinDetails { .. } => "get_bin_details",
            Action::GetBinLocations => "get_bin_locations",
            Action::AddBin => "add_bin",
            Action::DeleteBin { .. } => "delete_bin",
            Action::RecoverBin { .. } => "recover_bin",
            Action::UpdateBinDetail(_) => "update_bin_detail",
            Action::AddSensor(_) => "add_sensor",
            Action::DeleteSensor { .. } => "delete_sensor",
            Action::UpdateSensorReading(_) => "update_sensor_reading",
            Action::SubmitContact(_) => "submit_contact",
        }
    }

    /// Whether the action changes the store and so must arrive by POST
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Action::GetBins
                | Action::GetDeletedBins
                | Action::GetBinDetails { .. }
                | Action::GetBinLocations
        )
    }

    /// Execute against the request's store session
    pub async fn run(
        self,
        conn: &mut SqliteConnection,
        settings: &Settings,
    ) -> Result<ActionOutcome, ApiError> {
        let bad_threshold = settings.air_quality.bad_threshold;
        let outcome = match self {
            Action::GetBins => ActionOutcome::Bins(bins::list_active(conn).await?),
            Action::GetDeletedBins => ActionOutcome::DeletedBins(bins::list_deleted(conn).await?),
            Action::GetBinDetails { bin_id } => {
                ActionOutcome::BinDetails(bins::details(conn, bin_id).await?)
            }
            Action::GetBinLocations => ActionOutcome::BinLocations(
                bins::locate(conn, settings.map.center, &settings.map.locations).await?,
            ),
            Action::AddBin => ActionOutcome::BinAdded(bins::add(conn).await?),
            Action::DeleteBin { bin_id } => ActionOutcome::BinDeleted {
                changed: bins::soft_delete(conn, bin_id).await?,
            },
            Action::RecoverBin { bin_id } => {
                ActionOutcome::BinRecovered(bins::recover(conn, bin_id).await?)
            }
            Action::UpdateBinDetail(update) => {
                bins::update_field(conn, update.bin_id, update.field, &update.value).await?;
                ActionOutcome::BinDetailUpdated(update.field)
            }
            Action::AddSensor(new) => {
                ActionOutcome::SensorAdded(sensors::add(conn, new.bin_id, &new.sensor_name).await?)
            }
            Action::DeleteSensor { sensor_id } => {
                sensors::delete(conn, sensor_id, bad_threshold).await?;
                ActionOutcome::SensorDeleted
            }
            Action::UpdateSensorReading(reading) => ActionOutcome::ReadingRecorded {
                stored: sensors::record_reading(conn, reading.sensor_id, reading.value, bad_threshold)
                    .await?,
            },
            Action::SubmitContact(submission) => {
                contact::submit(conn, &submission).await?;
                ActionOutcome::ContactSubmitted
            }
        };
        Ok(outcome)
    }
}

fn text<'a>(params: &'a Params, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or("")
}

fn positive_id(params: &Params, key: &str) -> Option<i64> {
    params
        .get(key)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

fn invalid_bin_id() -> ApiError {
    ApiError::validation("Invalid or missing Bin ID.")
}

fn detail_update(params: &Params) -> Result<DetailUpdate, ApiError> {
    let bin_id = positive_id(params, "bin_id");
    let label = params.get("field").map(|s| s.trim()).filter(|s| !s.is_empty());
    let raw = params.get("value");
    let (Some(bin_id), Some(label), Some(raw)) = (bin_id, label, raw) else {
        return Err(ApiError::validation("Missing required fields for update."));
    };

    let field = EditableField::from_label(label)
        .ok_or_else(|| ApiError::validation("Invalid field specified for update."))?;

    let value = match field {
        EditableField::Location => FieldValue::Text(raw.trim().to_string()),
        EditableField::LastMaintenance => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(FieldValue::Date)
            .map_err(|_| {
                ApiError::validation("Invalid date for Last Maintenance; expected YYYY-MM-DD.")
            })?,
    };

    Ok(DetailUpdate {
        bin_id,
        field,
        value,
    })
}
