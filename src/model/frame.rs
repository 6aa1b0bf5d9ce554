//! Raw frames as reported by the feed.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::error::FormatError;

/// Offset-aware layouts tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Naive layouts, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One reported reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawFrame {
    /// Source-assigned id; not guaranteed strictly increasing across retries.
    pub entry_id: u64,
    pub observed_at: DateTime<Utc>,
    pub payload: String,
}

impl RawFrame {
    pub fn new(entry_id: u64, observed_at: DateTime<Utc>, payload: impl Into<String>) -> Self {
        Self {
            entry_id,
            observed_at,
            payload: payload.into(),
        }
    }

    /// Build a frame from a source timestamp string.
    pub fn parse(
        entry_id: u64,
        observed_at: &str,
        payload: impl Into<String>,
    ) -> Result<Self, FormatError> {
        Ok(Self::new(entry_id, parse_timestamp(observed_at)?, payload))
    }
}

/// Parse a source timestamp and normalise it to UTC.
///
/// Offset-aware values are converted; naive values are taken as UTC so both
/// kinds compare on the same scale.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, FormatError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(FormatError::InvalidTimestamp(value.to_string()))
}
