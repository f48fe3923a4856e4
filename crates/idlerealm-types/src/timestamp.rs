//! Lenient timestamp decoding for values that round-trip through the save
//! store.
//!
//! Timestamps are always *written* as RFC 3339 strings (chrono's default
//! serde format). When they come back from the remote store they may have
//! been rewritten by the transport, so the decoder accepts:
//!
//! | Encoding | Example |
//! |----------|---------|
//! | RFC 3339 string | `"2025-01-01T12:00:00Z"` |
//! | Epoch milliseconds | `1735732800000` |
//! | Epoch milliseconds as a string | `"1735732800000"` |
//! | Structured seconds/nanoseconds | `{"seconds": 1735732800, "nanoseconds": 0}` |
//!
//! The structured form also accepts the underscore-prefixed field names
//! (`_seconds`, `_nanoseconds`) some document stores emit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Errors produced when a raw timestamp cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// The string was neither RFC 3339 nor an integer millisecond count.
    #[error("unrecognised timestamp string: {0}")]
    Unrecognised(String),

    /// The numeric value is outside chrono's representable range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(i64),
}

/// A structured `{seconds, nanoseconds}` timestamp.
#[derive(Debug, Clone, Copy, Deserialize)]
struct StructuredTimestamp {
    #[serde(alias = "_seconds")]
    seconds: i64,
    #[serde(default, alias = "_nanoseconds", alias = "nanos")]
    nanoseconds: u32,
}

/// Every shape a timestamp may take on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
    Structured(StructuredTimestamp),
}

/// Parse a timestamp string in either RFC 3339 or epoch-milliseconds form.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_err| TimestampError::Unrecognised(raw.to_owned()))
        .and_then(from_millis)
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, TimestampError> {
    DateTime::from_timestamp_millis(millis).ok_or(TimestampError::OutOfRange(millis))
}

impl RawTimestamp {
    fn resolve(self) -> Result<DateTime<Utc>, TimestampError> {
        match self {
            Self::Millis(millis) => from_millis(millis),
            Self::Text(text) => parse_timestamp(&text),
            Self::Structured(s) => DateTime::from_timestamp(s.seconds, s.nanoseconds)
                .ok_or(TimestampError::OutOfRange(s.seconds)),
        }
    }
}

/// Serde `deserialize_with` adapter for a required lenient timestamp.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    RawTimestamp::deserialize(deserializer)?
        .resolve()
        .map_err(serde::de::Error::custom)
}

/// Serde `deserialize_with` adapter for an optional lenient timestamp.
///
/// Use together with `#[serde(default)]` so a missing field decodes as `None`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawTimestamp>::deserialize(deserializer)?
        .map(RawTimestamp::resolve)
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "deserialize")]
        at: DateTime<Utc>,
    }

    fn expected() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn accepts_rfc3339_string() {
        let h: Holder = serde_json::from_str(r#"{"at":"2025-01-01T12:00:00Z"}"#).unwrap();
        assert_eq!(h.at, expected());
    }

    #[test]
    fn accepts_offset_string() {
        let h: Holder = serde_json::from_str(r#"{"at":"2025-01-01T14:00:00+02:00"}"#).unwrap();
        assert_eq!(h.at, expected());
    }

    #[test]
    fn accepts_epoch_millis_number_and_string() {
        let millis = expected().timestamp_millis();
        let h: Holder = serde_json::from_str(&format!(r#"{{"at":{millis}}}"#)).unwrap();
        assert_eq!(h.at, expected());
        let h: Holder = serde_json::from_str(&format!(r#"{{"at":"{millis}"}}"#)).unwrap();
        assert_eq!(h.at, expected());
    }

    #[test]
    fn accepts_structured_forms() {
        let secs = expected().timestamp();
        let h: Holder =
            serde_json::from_str(&format!(r#"{{"at":{{"seconds":{secs},"nanoseconds":0}}}}"#))
                .unwrap();
        assert_eq!(h.at, expected());
        let h: Holder = serde_json::from_str(&format!(r#"{{"at":{{"_seconds":{secs}}}}}"#)).unwrap();
        assert_eq!(h.at, expected());
    }

    #[test]
    fn rejects_garbage() {
        let result: Result<Holder, _> = serde_json::from_str(r#"{"at":"next tuesday"}"#);
        assert!(result.is_err());
        assert!(matches!(
            parse_timestamp("next tuesday"),
            Err(TimestampError::Unrecognised(_))
        ));
    }

    #[test]
    fn optional_adapter_handles_null() {
        #[derive(Debug, Deserialize)]
        struct Maybe {
            #[serde(default, deserialize_with = "deserialize_option")]
            at: Option<DateTime<Utc>>,
        }
        let m: Maybe = serde_json::from_str(r#"{"at":null}"#).unwrap();
        assert!(m.at.is_none());
        let m: Maybe = serde_json::from_str("{}").unwrap();
        assert!(m.at.is_none());
        let m: Maybe = serde_json::from_str(r#"{"at":"2025-01-01T12:00:00Z"}"#).unwrap();
        assert_eq!(m.at, Some(expected()));
    }
}
