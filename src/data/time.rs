//! Time range resolution and timestamp normalization.
//!
//! All query bounds and every timestamp handed back to callers are UTC.
//! Input strings are ISO 8601; values without an offset are read in the
//! process local timezone (or an explicitly supplied zone).

use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDateTime, Offset, SecondsFormat,
    TimeZone, Utc,
};
use serde::Serialize;

use super::error::{DataError, Result};

/// Lookback applied when no start time is given
pub const DEFAULT_LOOKBACK_DAYS: i64 = 14;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A validated query interval, both ends in UTC with `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting empty or inverted intervals
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(DataError::InvalidRange { start, end });
        }
        Ok(TimeRange { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Result of parsing an ISO 8601 string, before any zone is assumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParsedTimestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl ParsedTimestamp {
    fn into_utc<Tz: TimeZone>(self, tz: &Tz, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ParsedTimestamp::Aware(dt) => Some(dt.with_timezone(&Utc)),
            ParsedTimestamp::Naive(naive) => assume_zone(naive, tz, now),
        }
    }
}

/// Pad the short ISO 8601 shapes out to `YYYY-MM-DDTHH:MM`.
///
/// `YYYY-MM-DD` and `YYYY-MM-DD±HH:MM` get a midnight time, and an hour-only
/// time (`YYYY-MM-DDTHH`, optionally with an offset) gets `:00` minutes.
/// Returns `None` unless the input starts with a four-digit year from 0001.
fn expand_short_forms(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let year = bytes.get(..4)?;
    if !year.iter().all(u8::is_ascii_digit) || year == b"0000" || bytes.get(4) != Some(&b'-') {
        return None;
    }

    let is_offset_sign = |b: Option<&u8>| matches!(b, Some(b'+') | Some(b'-'));
    let mut expanded = input.to_string();
    match bytes.get(10) {
        None => expanded.push_str("T00:00"),
        Some(b'+') | Some(b'-') => expanded.insert_str(10, "T00:00"),
        Some(b'T') | Some(b' ')
            if bytes.get(11..13).is_some_and(|h| h.iter().all(u8::is_ascii_digit))
                && (bytes.len() == 13 || is_offset_sign(bytes.get(13))) =>
        {
            expanded.insert_str(13, ":00")
        }
        _ => {}
    }
    Some(expanded)
}

/// Parse an ISO 8601 timestamp. A trailing `Z` is read as `+00:00`.
fn parse_iso8601(input: &str, field: &'static str) -> Result<ParsedTimestamp> {
    let trimmed = input.trim();
    let with_offset = match trimmed.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => trimmed.to_string(),
    };
    let candidate = expand_short_forms(&with_offset)
        .ok_or_else(|| DataError::invalid_format(field, input))?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(&candidate) {
        return Ok(ParsedTimestamp::Aware(dt));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&candidate, format) {
            return Ok(ParsedTimestamp::Aware(dt));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&candidate, format) {
            return Ok(ParsedTimestamp::Naive(naive));
        }
    }

    Err(DataError::invalid_format(field, input))
}

/// Parse `raw` and convert it to UTC, reporting failures against `field`
fn parse_to_utc<Tz: TimeZone>(
    raw: &str,
    field: &'static str,
    tz: &Tz,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    parse_iso8601(raw, field)?
        .into_utc(tz, now)
        .ok_or_else(|| DataError::invalid_format(field, raw))
}

/// Pin a naive wall-clock time to `tz` and convert it to UTC.
///
/// Ambiguous times (DST fall-back) take the earliest instant. Times that fall
/// in a DST gap use the zone's offset as of `now`.
fn assume_zone<Tz: TimeZone>(
    naive: NaiveDateTime,
    tz: &Tz,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(&now.naive_utc()).fix();
            naive
                .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
                .map(|shifted| Utc.from_utc_datetime(&shifted))
        }
    }
}

/// Normalize a timestamp string to UTC, assuming the local timezone when the
/// string carries no offset.
pub fn normalize_timestamp(timestamp: &str) -> Result<DateTime<Utc>> {
    normalize_timestamp_in(timestamp, &Local)
}

/// Same as [`normalize_timestamp`] with the assumed zone supplied by the caller.
pub fn normalize_timestamp_in<Tz: TimeZone>(timestamp: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    parse_to_utc(timestamp, "timestamp", tz, Utc::now())
}

/// Resolve optional start/end strings into a validated range.
///
/// A missing `end` means now; a missing `start` means `end` minus
/// [`DEFAULT_LOOKBACK_DAYS`]. Empty strings count as missing.
pub fn resolve_time_range(start: Option<&str>, end: Option<&str>) -> Result<TimeRange> {
    resolve_time_range_at(start, end, Utc::now(), &Local)
}

/// Same as [`resolve_time_range`] with the clock and assumed zone supplied by the caller.
pub fn resolve_time_range_at<Tz: TimeZone>(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<TimeRange> {
    let end_raw = end.filter(|s| !s.is_empty());
    let end = match end_raw {
        Some(raw) => parse_to_utc(raw, "end_time", tz, now)?,
        None => now,
    };
    let start = match start.filter(|s| !s.is_empty()) {
        Some(raw) => parse_to_utc(raw, "start_time", tz, now)?,
        None => end
            .checked_sub_signed(Duration::days(DEFAULT_LOOKBACK_DAYS))
            .ok_or_else(|| {
                DataError::invalid_format("end_time", end_raw.unwrap_or_default())
            })?,
    };
    TimeRange::new(start, end)
}

/// Render a UTC timestamp as RFC 3339 with an explicit `+00:00` offset
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
