//! Lenient timestamp parsing.
//!
//! Due dates arrive as free text from callers and timestamps arrive in whatever
//! shape the server's scalar serializer emits. Both end up as absolute UTC
//! instants. Text without an offset is read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Parse a timestamp into an absolute instant.
///
/// Accepts RFC 3339 (any offset), ISO-like date-times without an offset,
/// bare `YYYY-MM-DD` dates (midnight UTC) and the `DD-MM-YYYY HH:MM:SS` form.
/// Returns `None` when no format matches.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
