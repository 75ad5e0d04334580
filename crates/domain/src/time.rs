//! Time and timestamp helpers.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::ValidationError;

/// UTC timestamp used for value-states, request windows and events.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse a duration such as `250ms`, `30s`, `15m`, `2h` or `1d`.
///
/// A bare number is read as milliseconds.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedTime`] for anything else.
pub fn parse_duration(text: &str) -> Result<TimeDelta, ValidationError> {
    let malformed = || ValidationError::MalformedTime(text.to_string());
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);
    let amount: i64 = digits.parse().map_err(|_| malformed())?;
    let delta = match unit {
        "" | "ms" => TimeDelta::try_milliseconds(amount),
        "s" => TimeDelta::try_seconds(amount),
        "m" => TimeDelta::try_minutes(amount),
        "h" => TimeDelta::try_hours(amount),
        "d" => TimeDelta::try_days(amount),
        _ => None,
    };
    delta.ok_or_else(malformed)
}

/// Render a duration in the largest unit that represents it exactly.
#[must_use]
pub fn format_duration(delta: TimeDelta) -> String {
    let ms = delta.num_milliseconds();
    let units = [(86_400_000, "d"), (3_600_000, "h"), (60_000, "m"), (1000, "s")];
    for (size, suffix) in units {
        if ms != 0 && ms % size == 0 {
            return format!("{}{suffix}", ms / size);
        }
    }
    format!("{ms}ms")
}

/// Parse an absolute RFC 3339 time or a relative offset from `now`.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedTime`] when neither form matches.
pub fn parse_time(text: &str, now: Timestamp) -> Result<Timestamp, ValidationError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    parse_duration(text).map(|delta| now + delta)
}

/// Serde helper storing an optional [`TimeDelta`] as milliseconds.
pub mod opt_duration_ms {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<TimeDelta>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(delta) => s.serialize_some(&delta.num_milliseconds()),
            None => s.serialize_none(),
        }
    }

    /// # Errors
    ///
    /// Fails when the input is not an optional integer.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TimeDelta>, D::Error> {
        Ok(Option::<i64>::deserialize(d)?.and_then(TimeDelta::try_milliseconds))
    }
}
