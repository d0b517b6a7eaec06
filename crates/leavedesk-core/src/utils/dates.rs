//! Parsing of the date strings the remote sends.
//!
//! The API is not consistent: calendar dates arrive either as `YYYY-MM-DD`
//! or as a full RFC 3339 timestamp at midnight UTC, and timestamps sometimes
//! lack an offset.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: '{value}'")]
pub struct DateParseError {
    pub field: &'static str,
    pub value: String,
}

impl DateParseError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
/// Timestamps are read in UTC.
pub fn parse_wire_date(field: &'static str, value: &str) -> Result<NaiveDate, DateParseError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    Err(DateParseError::new(field, value))
}

/// Parse a UTC timestamp. Offset-less values are taken as UTC, bare dates
/// as midnight UTC.
pub fn parse_wire_timestamp(
    field: &'static str,
    value: &str,
) -> Result<DateTime<Utc>, DateParseError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(DateParseError::new(field, value))
}

/// Parse an `HH:MM` time of day as entered on time edit requests
pub fn parse_clock_time(field: &'static str, value: &str) -> Result<NaiveTime, DateParseError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| DateParseError::new(field, value))
}
