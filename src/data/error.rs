//! Error types for the data layer.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by connection handling, time parsing and repository queries.
#[derive(Debug, Error)]
pub enum DataError {
    /// A repository was used before `connect()` (or after `close()`).
    #[error("Database not connected.")]
    NotConnected,

    #[error("Invalid {field} format: {input:?}. Use ISO 8601 (e.g., 2023-10-01T12:34:56Z)")]
    InvalidFormat { field: &'static str, input: String },

    #[error("Start time must be earlier than end time (start: {start}, end: {end})")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Failed to connect to MongoDB: {0}")]
    Connection(#[source] mongodb::error::Error),

    #[error("Failed to query `{collection}`: {source}")]
    Query {
        collection: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
}

pub type Result<T> = std::result::Result<T, DataError>;

impl DataError {
    pub(crate) fn invalid_format(field: &'static str, input: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field,
            input: input.into(),
        }
    }

    pub(crate) fn query(collection: &'static str, source: mongodb::error::Error) -> Self {
        Self::Query { collection, source }
    }
}
