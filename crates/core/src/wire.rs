//! Wire date handling for the marketplace backend.
//!
//! The backend emits timestamps in exactly one shape:
//! `2025-03-14T09:26:53.589+0000`, millisecond precision with a numeric
//! RFC-822 zone. Looser ISO-8601 variants (a bare `Z` suffix, missing
//! milliseconds, a colon in the offset) are rejected so that a format
//! drift on the server side surfaces as a decode error instead of
//! silently shifting timestamps.

use chrono::{DateTime, Utc};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%3f%z";

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error(transparent)]
    Parse(#[from] chrono::ParseError),

    /// `%z` also tolerates `+00:00`; the wire format never uses a colon.
    #[error("timestamp offset must not contain a colon: {0}")]
    ColonOffset(String),
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(DATE_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimestampError> {
    let dt = DateTime::parse_from_str(s, DATE_FORMAT)?;
    let offset = s.rsplit(['+', '-']).next().unwrap_or_default();
    if offset.contains(':') {
        return Err(TimestampError::ColonOffset(s.to_string()));
    }
    Ok(dt.with_timezone(&Utc))
}

/// Serde adapter for required timestamp fields. Use as
/// `#[serde(with = "pharmatrade_core::wire::timestamp")]`.
pub mod timestamp {
    use super::*;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
pub mod timestamp_opt {
    use super::*;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => serializer.serialize_some(&format_timestamp(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            Some(s) => parse_timestamp(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_fixed_offset_wire_format() {
        let dt = parse_timestamp("2025-03-14T09:26:53.589+0000").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap() + chrono::Duration::milliseconds(589));
    }

    #[test]
    fn normalizes_non_utc_offsets() {
        let dt = parse_timestamp("2025-03-14T11:26:53.589+0200").unwrap();
        assert_eq!(format_timestamp(&dt), "2025-03-14T09:26:53.589+0000");
    }

    #[test]
    fn rejects_zulu_suffix() {
        assert!(parse_timestamp("2025-03-14T09:26:53.589Z").is_err());
    }

    #[test]
    fn rejects_missing_milliseconds() {
        assert!(parse_timestamp("2025-03-14T09:26:53+0000").is_err());
    }

    #[test]
    fn rejects_colon_in_offset() {
        assert!(parse_timestamp("2025-03-14T09:26:53.589+00:00").is_err());
        assert!(parse_timestamp("2025-03-14T11:26:53.589-02:00").is_err());
    }

    #[test]
    fn round_trips_through_format() {
        let s = "2024-12-01T23:59:59.001+0000";
        let dt = parse_timestamp(s).unwrap();
        assert_eq!(format_timestamp(&dt), s);
    }
}
