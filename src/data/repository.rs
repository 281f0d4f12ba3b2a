//! Read-only repositories over the Nightscout collections.
//!
//! Every query follows the same shape: check the connection, resolve the time
//! range, filter the collection's time field inclusively on both ends, then
//! strip ids and normalize the timestamp field of each returned record.
//!
//! - `entries`: `date` holds epoch milliseconds
//! - `devicestatus`, `profile`, `treatments`: `created_at` holds an ISO 8601
//!   string, compared lexically against `YYYY-MM-DDTHH:MM:SS.mmmZ` bounds

use bson::{doc, Document};
use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::options::{FindOneOptions, FindOptions};
use mongodb::sync::Database;
use tracing::debug;

use super::connection::MongoConnection;
use super::error::{DataError, Result};
use super::models::{
    clean_record, Collection, Record, TimeEncoding, DEVICE_STATUS, ENTRIES, ID_FIELD, PROFILE,
    TREATMENTS,
};
use super::time::{resolve_time_range, TimeRange};

/// Render a bound the way Nightscout writes `created_at`
fn iso_bound(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `{field: {$gte: start_ms, $lte: end_ms}}`
fn millis_filter(field: &str, range: &TimeRange) -> Document {
    let mut filter = Document::new();
    filter.insert(
        field,
        doc! {
            "$gte": range.start().timestamp_millis(),
            "$lte": range.end().timestamp_millis(),
        },
    );
    filter
}

/// `{field: {$gte: start_iso, $lte: end_iso}}`
fn iso_filter(field: &str, range: &TimeRange) -> Document {
    let mut filter = Document::new();
    filter.insert(
        field,
        doc! {
            "$gte": iso_bound(&range.start()),
            "$lte": iso_bound(&range.end()),
        },
    );
    filter
}

/// `{field: {$lt: start_iso}}`, used to find the profile in effect at `start`
fn before_start_filter(field: &str, range: &TimeRange) -> Document {
    let mut filter = Document::new();
    filter.insert(field, doc! { "$lt": iso_bound(&range.start()) });
    filter
}

/// Projection that drops `_id` and keeps the collection's fields
fn projection(collection: &Collection) -> Document {
    let mut projection = Document::new();
    projection.insert(ID_FIELD, 0);
    for field in collection.fields {
        projection.insert(*field, 1);
    }
    projection
}

fn sort_by(field: &str, direction: i32) -> Document {
    let mut sort = Document::new();
    sort.insert(field, direction);
    sort
}

/// Build the time filter for a collection
fn time_filter(collection: &Collection, range: &TimeRange) -> Document {
    match collection.time_encoding {
        TimeEncoding::EpochMillis => millis_filter(collection.time_field, range),
        TimeEncoding::IsoString => iso_filter(collection.time_field, range),
    }
}

/// Run a find and clean every returned record
fn find_records(
    db: &Database,
    collection: &Collection,
    filter: Document,
    sort: Option<Document>,
) -> Result<Vec<Record>> {
    debug!(collection = collection.name, %filter, "find");

    let mut options = FindOptions::default();
    options.projection = Some(projection(collection));
    options.sort = sort;

    let cursor = db
        .collection::<Document>(collection.name)
        .find(filter, options)
        .map_err(|e| DataError::query(collection.name, e))?;

    let mut records = Vec::new();
    for row in cursor {
        let mut record = row.map_err(|e| DataError::query(collection.name, e))?;
        clean_record(&mut record, collection.timestamp_field)?;
        records.push(record);
    }

    debug!(collection = collection.name, count = records.len(), "find returned");
    Ok(records)
}

/// Put the profile in effect before the range ahead of the in-range profiles
fn with_previous(previous: Option<Record>, mut in_range: Vec<Record>) -> Vec<Record> {
    if let Some(previous) = previous {
        in_range.insert(0, previous);
    }
    in_range
}

/// Glucose readings from `entries`
#[derive(Debug, Clone, Copy)]
pub struct GlucoseReadingsRepository<'a> {
    conn: &'a MongoConnection,
}

impl<'a> GlucoseReadingsRepository<'a> {
    pub fn new(conn: &'a MongoConnection) -> Self {
        GlucoseReadingsRepository { conn }
    }

    /// Readings with `sgv`, `dateString`, `trend` and `direction`
    pub fn get_glucose_readings(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<Record>> {
        let db = self.conn.database()?;
        let range = resolve_time_range(start, end)?;
        find_records(db, &ENTRIES, time_filter(&ENTRIES, &range), None)
    }
}

/// Pump, uploader and device state from `devicestatus`
#[derive(Debug, Clone, Copy)]
pub struct DeviceStatusRepository<'a> {
    conn: &'a MongoConnection,
}

impl<'a> DeviceStatusRepository<'a> {
    pub fn new(conn: &'a MongoConnection) -> Self {
        DeviceStatusRepository { conn }
    }

    pub fn get_device_status(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<Record>> {
        let db = self.conn.database()?;
        let range = resolve_time_range(start, end)?;
        find_records(
            db,
            &DEVICE_STATUS,
            time_filter(&DEVICE_STATUS, &range),
            None,
        )
    }
}

/// Therapy profiles from `profile`
#[derive(Debug, Clone, Copy)]
pub struct ProfileRepository<'a> {
    conn: &'a MongoConnection,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(conn: &'a MongoConnection) -> Self {
        ProfileRepository { conn }
    }

    /// Profiles created within the range, oldest first.
    ///
    /// The most recent profile created strictly before the start of the range
    /// is prepended when one exists, since it was still in effect at `start`.
    pub fn get_profiles(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<Record>> {
        let db = self.conn.database()?;
        let range = resolve_time_range(start, end)?;

        let in_range = find_records(
            db,
            &PROFILE,
            time_filter(&PROFILE, &range),
            Some(sort_by(PROFILE.time_field, 1)),
        )?;

        let filter = before_start_filter(PROFILE.time_field, &range);
        debug!(collection = PROFILE.name, %filter, "find_one previous");
        let mut options = FindOneOptions::default();
        options.projection = Some(projection(&PROFILE));
        options.sort = Some(sort_by(PROFILE.time_field, -1));

        let previous = db
            .collection::<Document>(PROFILE.name)
            .find_one(filter, options)
            .map_err(|e| DataError::query(PROFILE.name, e))?
            .map(|mut record| clean_record(&mut record, PROFILE.timestamp_field).map(|_| record))
            .transpose()?;

        Ok(with_previous(previous, in_range))
    }
}

/// Insulin and other treatment events from `treatments`
#[derive(Debug, Clone, Copy)]
pub struct TreatmentsRepository<'a> {
    conn: &'a MongoConnection,
}

impl<'a> TreatmentsRepository<'a> {
    pub fn new(conn: &'a MongoConnection) -> Self {
        TreatmentsRepository { conn }
    }

    pub fn get_treatments(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<Record>> {
        let db = self.conn.database()?;
        let range = resolve_time_range(start, end)?;
        find_records(db, &TREATMENTS, time_filter(&TREATMENTS, &range), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn range() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2023, 10, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 10, 15, 12, 30, 0).unwrap(),
        )
        .unwrap()
    }

    fn closed() -> MongoConnection {
        MongoConnection::new("mongodb://<db_username>:<db_password>@localhost", "u", "p")
    }

    #[test]
    fn test_entries_filter_uses_epoch_millis() {
        let filter = time_filter(&ENTRIES, &range());
        assert_eq!(
            filter,
            doc! { "date": { "$gte": 1_696_118_400_000_i64, "$lte": 1_697_373_000_000_i64 } }
        );
    }

    #[test]
    fn test_created_at_filters_use_iso_strings() {
        let expected = doc! {
            "created_at": {
                "$gte": "2023-10-01T00:00:00.000Z",
                "$lte": "2023-10-15T12:30:00.000Z",
            }
        };
        for collection in [DEVICE_STATUS, PROFILE, TREATMENTS] {
            assert_eq!(time_filter(&collection, &range()), expected);
        }
    }

    #[test]
    fn test_before_start_filter() {
        assert_eq!(
            before_start_filter("created_at", &range()),
            doc! { "created_at": { "$lt": "2023-10-01T00:00:00.000Z" } }
        );
    }

    #[test]
    fn test_projection_excludes_id() {
        assert_eq!(
            projection(&ENTRIES),
            doc! { "_id": 0, "sgv": 1, "dateString": 1, "trend": 1, "direction": 1 }
        );
        assert_eq!(projection(&PROFILE), doc! { "_id": 0 });
    }

    #[test]
    fn test_with_previous_prepends() {
        let in_range = vec![doc! { "created_at": "b" }, doc! { "created_at": "c" }];
        let merged = with_previous(Some(doc! { "created_at": "a" }), in_range.clone());
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].get_str("created_at").unwrap(), "a");

        assert_eq!(with_previous(None, in_range.clone()), in_range);
    }

    #[test]
    fn test_not_connected_checked_before_time_parsing() {
        let conn = closed();
        let err = GlucoseReadingsRepository::new(&conn)
            .get_glucose_readings(Some("garbage"), None)
            .unwrap_err();
        assert!(matches!(err, DataError::NotConnected));
    }
}
