//! Uniform JSON response envelope and per-action outcomes

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::bins::EditableField;
use crate::models::{Bin, BinDetails, BinLocations, Sensor};

/// What a successful action produced
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    Bins(Vec<Bin>),
    DeletedBins(Vec<Bin>),
    BinDetails(BinDetails),
    BinLocations(BinLocations),
    BinAdded(Bin),
    BinDeleted { changed: bool },
    /// `None` when the bin was found deleted but the update matched no row
    BinRecovered(Option<Bin>),
    BinDetailUpdated(EditableField),
    SensorAdded(Sensor),
    SensorDeleted,
    ReadingRecorded { stored: bool },
    ContactSubmitted,
}

/// The action-specific top-level key of a response
#[derive(Debug, Clone)]
pub enum Payload {
    Bins(Vec<Bin>),
    BinDetails(BinDetails),
    BinLocations(BinLocations),
    NewBin(Bin),
    NewSensor(Sensor),
    RecoveredBin(Option<Bin>),
}

impl Payload {
    pub fn key(&self) -> &'static str {
        match self {
            Payload::Bins(_) | Payload::BinDetails(_) | Payload::BinLocations(_) => "data",
            Payload::NewBin(_) => "newBin",
            Payload::NewSensor(_) => "newSensor",
            Payload::RecoveredBin(_) => "recoveredBin",
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Bins(bins) => bins.serialize(serializer),
            Payload::BinDetails(details) => details.serialize(serializer),
            Payload::BinLocations(locations) => locations.serialize(serializer),
            Payload::NewBin(bin) => bin.serialize(serializer),
            Payload::NewSensor(sensor) => sensor.serialize(serializer),
            Payload::RecoveredBin(bin) => bin.serialize(serializer),
        }
    }
}

/// `{success, message, <payload key>?}`
#[derive(Debug, Clone)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    pub payload: Option<Payload>,
}

impl Envelope {
    pub fn success(message: impl Into<String>, payload: Option<Payload>) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: None,
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.payload.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("success", &self.success)?;
        map.serialize_entry("message", &self.message)?;
        if let Some(payload) = &self.payload {
            map.serialize_entry(payload.key(), payload)?;
        }
        map.end()
    }
}

impl From<ActionOutcome> for Envelope {
    fn from(outcome: ActionOutcome) -> Self {
        match outcome {
            ActionOutcome::Bins(bins) => {
                Envelope::success("Bins retrieved.", Some(Payload::Bins(bins)))
            }
            ActionOutcome::DeletedBins(bins) => {
                Envelope::success("Deleted bins retrieved.", Some(Payload::Bins(bins)))
            }
            ActionOutcome::BinDetails(details) => {
                Envelope::success("Bin details retrieved.", Some(Payload::BinDetails(details)))
            }
            ActionOutcome::BinLocations(locations) => Envelope::success(
                "Bin locations retrieved.",
                Some(Payload::BinLocations(locations)),
            ),
            ActionOutcome::BinAdded(bin) => {
                Envelope::success("Bin added successfully.", Some(Payload::NewBin(bin)))
            }
            ActionOutcome::BinDeleted { changed: true } => {
                Envelope::success("Bin marked as deleted.", None)
            }
            ActionOutcome::BinDeleted { changed: false } => {
                Envelope::success("Bin not found or already deleted.", None)
            }
            ActionOutcome::BinRecovered(Some(bin)) => {
                Envelope::success("Bin recovered.", Some(Payload::RecoveredBin(Some(bin))))
            }
            ActionOutcome::BinRecovered(None) => Envelope::success(
                "Bin not found or already active.",
                Some(Payload::RecoveredBin(None)),
            ),
            ActionOutcome::BinDetailUpdated(field) => {
                Envelope::success(format!("{} updated successfully.", field.label()), None)
            }
            ActionOutcome::SensorAdded(sensor) => {
                Envelope::success("Sensor added.", Some(Payload::NewSensor(sensor)))
            }
            ActionOutcome::SensorDeleted => Envelope::success("Sensor removed.", None),
            ActionOutcome::ReadingRecorded { stored: true } => {
                Envelope::success("Sensor reading added.", None)
            }
            ActionOutcome::ReadingRecorded { stored: false } => {
                Envelope::success("Sensor value set (no history added).", None)
            }
            ActionOutcome::ContactSubmitted => {
                Envelope::success("Message sent successfully! Thank you.", None)
            }
        }
    }
}
