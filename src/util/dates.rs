//! Date parsing helpers for commit and deletion timestamps.
//!
//! The backend formats commit dates the way `git log` prints them
//! (`Mon Jan 15 12:00:00 2024 +0000`), while timestamps written by this crate
//! use RFC 3339. Both are accepted, together with a handful of common variants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Offset-carrying formats tried after RFC 3339 and RFC 2822.
const OFFSET_FORMATS: &[&str] = &[
    "%a %b %e %H:%M:%S %Y %z",
    "%a %b %d %H:%M:%S %Y %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

/// Naive formats, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a date string in any of the accepted formats.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Whether `value` parses as a date.
pub fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// ISO 8601 timestamp with millisecond precision and a `Z` suffix.
pub fn to_iso_string(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time as an ISO 8601 timestamp.
pub fn now_iso() -> String {
    to_iso_string(Utc::now())
}
