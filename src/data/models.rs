//! Records returned by the repositories and the collections they come from.

use bson::{Bson, Document};
use serde_json::Value;

use super::error::Result;
use super::time::{format_utc, normalize_timestamp};

/// One row from a collection. Keys are collection specific and untyped.
pub type Record = Document;

/// MongoDB's internal identifier field, never handed back to callers
pub const ID_FIELD: &str = "_id";

/// A Nightscout collection and the fields used to filter and reshape it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub name: &'static str,
    /// Field compared against the resolved time range
    pub time_field: &'static str,
    pub time_encoding: TimeEncoding,
    /// Timestamp field rewritten to normalized UTC on the way out
    pub timestamp_field: &'static str,
    /// Projected fields; empty means the whole document
    pub fields: &'static [&'static str],
}

/// How a collection stores its time field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    /// Milliseconds since the Unix epoch
    EpochMillis,
    /// ISO 8601 string
    IsoString,
}

/// Sensor glucose readings, filtered on epoch millis in `date`
pub const ENTRIES: Collection = Collection {
    name: "entries",
    time_field: "date",
    time_encoding: TimeEncoding::EpochMillis,
    timestamp_field: "dateString",
    fields: &["sgv", "dateString", "trend", "direction"],
};

pub const DEVICE_STATUS: Collection = Collection {
    name: "devicestatus",
    time_field: "created_at",
    time_encoding: TimeEncoding::IsoString,
    timestamp_field: "created_at",
    fields: &["created_at", "device", "pump", "uploader"],
};

pub const PROFILE: Collection = Collection {
    name: "profile",
    time_field: "created_at",
    time_encoding: TimeEncoding::IsoString,
    timestamp_field: "created_at",
    fields: &[],
};

pub const TREATMENTS: Collection = Collection {
    name: "treatments",
    time_field: "created_at",
    time_encoding: TimeEncoding::IsoString,
    timestamp_field: "created_at",
    fields: &["insulinType", "amount", "duration", "created_at", "eventType"],
};

/// Strip the internal id and normalize the timestamp field in place.
///
/// String timestamps go through [`normalize_timestamp`]; BSON dates are
/// rendered the same way. Anything else (or a missing field) is left alone.
pub fn clean_record(record: &mut Record, timestamp_field: &str) -> Result<()> {
    record.remove(ID_FIELD);

    let normalized = match record.get(timestamp_field) {
        Some(Bson::String(raw)) => format_utc(&normalize_timestamp(raw)?),
        Some(Bson::DateTime(dt)) => format_utc(&dt.to_chrono()),
        _ => return Ok(()),
    };
    record.insert(timestamp_field, normalized);
    Ok(())
}

/// Convert a record to relaxed extended JSON for display
pub fn record_to_json(record: Record) -> Value {
    Bson::Document(record).into_relaxed_extjson()
}
