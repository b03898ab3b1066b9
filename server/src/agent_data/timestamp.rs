//! ISO-8601 timestamp parsing and the canonical form used for storage and pushes.
//!
//! Agents send offset-qualified instants as well as naive date-times. Naive
//! values are taken as UTC. Every accepted value is normalized to RFC 3339 in
//! UTC, which is also what the database column holds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

#[derive(Debug, thiserror::Error)]
#[error("invalid timestamp {0:?}: expected ISO 8601, e.g. 2024-01-01T00:00:00Z")]
pub struct TimestampError(String);

/// Parse an ISO-8601 instant, normalizing to UTC.
pub fn parse(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(TimestampError(value.to_string()))
}

/// Canonical text form: RFC 3339, UTC, `Z` suffix, fractional seconds only when non-zero.
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `#[serde(with = "...")]` support.
pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn naive_datetime_is_taken_as_utc() {
        let parsed = parse("2024-01-01T00:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(format(&parsed), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn offsets_are_normalized() {
        let parsed = parse("2024-01-01T02:30:00+02:00").unwrap();
        assert_eq!(format(&parsed), "2024-01-01T00:30:00Z");

        let spaced = parse("2024-01-01 02:30:00+02:00").unwrap();
        assert_eq!(spaced, parsed);
    }

    #[test]
    fn fractional_seconds_survive() {
        let parsed = parse("2024-03-05T10:11:12.250Z").unwrap();
        assert_eq!(format(&parsed), "2024-03-05T10:11:12.250Z");
        assert_eq!(parse(&format(&parsed)).unwrap(), parsed);
    }

    #[test]
    fn space_separator_and_bare_date() {
        assert_eq!(
            format(&parse("2024-01-01 08:00:00").unwrap()),
            "2024-01-01T08:00:00Z"
        );
        assert_eq!(format(&parse("2024-06-30").unwrap()), "2024-06-30T00:00:00Z");
    }

    #[test]
    fn garbage_is_rejected() {
        for bad in ["", "yesterday", "2024-13-01T00:00:00", "2024-01-01T25:00:00", "1704067200"] {
            assert!(parse(bad).is_err(), "{bad:?} should not parse");
        }
    }
}
