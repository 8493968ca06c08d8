//! Input parsing shared by the REST layer and the service.
//!
//! Every helper fails with [`DomainError::InvalidArgument`] naming the offending field,
//! so malformed input is rejected before any lookup happens.

use chrono::{DateTime, NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Parse a textual identifier.
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| DomainError::invalid_argument(field, format!("'{}' is not a valid id", raw)))
}

/// Parse a required identifier, treating absence as a missing field.
pub fn require_id(field: &str, raw: Option<&str>) -> Result<Uuid, DomainError> {
    match non_blank(raw) {
        Some(value) => parse_id(field, value),
        None => Err(DomainError::missing_field(field)),
    }
}

/// Returns the value when it is present and not blank.
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// Timestamps keep the calendar date of their own offset.
pub fn parse_calendar_date(field: &str, raw: &str) -> Result<NaiveDate, DomainError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive())
        .map_err(|_| {
            DomainError::invalid_argument(field, format!("'{}' is not a valid date", raw))
        })
}

/// Validate a 24h `HH:MM` wall-clock time and return it unchanged.
pub fn validate_clock_time(field: &str, raw: &str) -> Result<String, DomainError> {
    let well_formed = raw.len() == 5 && NaiveTime::parse_from_str(raw, "%H:%M").is_ok();
    if !well_formed {
        return Err(DomainError::invalid_argument(
            field,
            format!("'{}' is not a valid HH:MM time", raw),
        ));
    }
    Ok(raw.to_string())
}
