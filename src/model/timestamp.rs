// SPDX-License-Identifier: MPL-2.0

//! Strict wire timestamps.
//!
//! The backend always sends ISO-8601 with fractional seconds and a `Z` suffix
//! (`2025-01-15T10:30:00.123Z`). Anything else is rejected instead of guessed.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format a timestamp the way the backend expects it: at least milliseconds,
/// more digits only when the value carries them, so parsed values re-encode
/// unchanged.
pub fn format(ts: &DateTime<Utc>) -> String {
    let nanos = ts.nanosecond() % 1_000_000_000;
    let precision = if nanos % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else if nanos % 1_000 == 0 {
        SecondsFormat::Micros
    } else {
        SecondsFormat::Nanos
    };
    ts.to_rfc3339_opts(precision, true)
}

/// Parse a wire timestamp, rejecting offsets and missing fractions.
pub fn parse(s: &str) -> Result<DateTime<Utc>, String> {
    let body = s
        .strip_suffix('Z')
        .ok_or_else(|| format!("invalid date format: {s}, expected ISO8601 with 'Z' suffix"))?;

    let fraction_ok = body
        .rsplit_once('.')
        .is_some_and(|(_, frac)| !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit()));
    if !fraction_ok {
        return Err(format!(
            "invalid date format: {s}, expected fractional seconds"
        ));
    }

    NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid date format: {s}: {e}"))
}

pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

/// Same rules for optional fields; `null` and a missing key both mean `None`.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&super::format(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| super::parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
