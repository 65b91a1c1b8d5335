//! Execution timestamps.
//!
//! Records and queue messages are correlated by comparing their
//! `execDateTime` strings byte for byte, so every timestamp produced here
//! uses the same fixed layout: `YYYY-MM-DD HH:MM:SS.mmm` in UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// chrono layout for `execDateTime` values.
pub const EXEC_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Error)]
#[error("Invalid execDateTime '{value}': {reason}")]
pub struct TimestampError {
    pub value: String,
    pub reason: String,
}

/// Format an instant as an `execDateTime` string.
pub fn format_exec_datetime(dt: DateTime<Utc>) -> String {
    dt.format(EXEC_DATETIME_FORMAT).to_string()
}

/// The current instant as an `execDateTime` string.
pub fn now_exec_datetime() -> String {
    format_exec_datetime(Utc::now())
}

/// Parse an `execDateTime` string back into a UTC instant.
pub fn parse_exec_datetime(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    NaiveDateTime::parse_from_str(value, EXEC_DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| TimestampError {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_every_field() {
        let dt = DateTime::parse_from_rfc3339("2024-01-02T03:04:05.006Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_exec_datetime(dt), "2024-01-02 03:04:05.006");
    }

    #[test]
    fn test_format_truncates_to_millis() {
        let dt = DateTime::parse_from_rfc3339("2023-12-31T23:59:59.999999Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_exec_datetime(dt), "2023-12-31 23:59:59.999");
    }

    #[test]
    fn test_format_converts_offsets_to_utc() {
        let dt = DateTime::parse_from_rfc3339("2024-06-01T00:30:00.120-03:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_exec_datetime(dt), "2024-06-01 03:30:00.120");
    }

    #[test]
    fn test_parse_and_format_agree() {
        let parsed = parse_exec_datetime("2024-01-02 03:04:05.006").unwrap();
        assert_eq!(format_exec_datetime(parsed), "2024-01-02 03:04:05.006");
    }

    #[test]
    fn test_parse_rejects_iso_layout() {
        let err = parse_exec_datetime("2024-01-02T03:04:05.006Z").unwrap_err();
        assert_eq!(err.value, "2024-01-02T03:04:05.006Z");
    }

    #[test]
    fn test_now_has_fixed_width() {
        assert_eq!(now_exec_datetime().len(), 23);
    }
}
