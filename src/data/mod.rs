//! Data layer for reading Nightscout collections from MongoDB.
//!
//! Handles the connection lifecycle, time range resolution, timestamp
//! normalization and the per-collection repositories.

mod connection;
mod error;
mod models;
mod repository;
pub mod time;

pub use connection::{MongoConnection, DEFAULT_DATABASE};
pub use error::{DataError, Result};
pub use models::{
    record_to_json, Collection, Record, TimeEncoding, DEVICE_STATUS, ENTRIES, PROFILE, TREATMENTS,
};
pub use repository::{
    DeviceStatusRepository, GlucoseReadingsRepository, ProfileRepository, TreatmentsRepository,
};
pub use time::{normalize_timestamp, resolve_time_range, TimeRange};
