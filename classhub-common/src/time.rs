//! Timestamp and calendar-date utilities

use chrono::{DateTime, NaiveDate};

use crate::{Error, Result};

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Normalize a client-supplied date string to a calendar day.
///
/// Accepts a bare ISO date (`2024-03-01`), an RFC 3339 instant
/// (`2024-03-01T09:30:00Z`, `2024-03-01T09:30:00+05:30`) or a naive
/// date-time (`2024-03-01T09:30:00`). The time of day is discarded; for
/// instants carrying an offset the calendar day is the one in that offset,
/// which is the day the caller was looking at when the value was produced.
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("date is required".to_string()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.date_naive());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.date());
    }

    Err(Error::InvalidInput(format!("Invalid date: {}", trimmed)))
}

/// Human-readable date used in notification messages, e.g. `March 1, 2024`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
