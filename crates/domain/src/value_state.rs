//! Value-state: a value together with its timestamp and validity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;
use crate::value::{Value, ValueType};

/// Validity of a [`ValueState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// The value is current and realised.
    Valid,
    /// Nothing is known about the value.
    Unknown,
    /// A realisation is outstanding; `value` holds the last known value.
    Busy,
}

/// The atomic unit exchanged between drivers, resources and subscribers.
///
/// Equality compares the state and, unless both are unknown, the value.
/// Timestamps are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueState {
    pub value: Option<Value>,
    pub timestamp: Option<Timestamp>,
    pub state: State,
}

impl ValueState {
    #[must_use]
    pub fn valid(value: Value, timestamp: Timestamp) -> Self {
        Self {
            value: Some(value),
            timestamp: Some(timestamp),
            state: State::Valid,
        }
    }

    /// Busy state, keeping `previous` as the last known value.
    #[must_use]
    pub fn busy(previous: Option<Value>, timestamp: Timestamp) -> Self {
        Self {
            value: previous,
            timestamp: Some(timestamp),
            state: State::Busy,
        }
    }

    #[must_use]
    pub fn unknown(timestamp: Option<Timestamp>) -> Self {
        Self {
            value: None,
            timestamp,
            state: State::Unknown,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state == State::Valid
    }

    /// Valid or busy.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.state != State::Unknown
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state == State::Busy
    }

    /// The value if the state is valid.
    #[must_use]
    pub fn valid_value(&self) -> Option<&Value> {
        if self.is_valid() {
            self.value.as_ref()
        } else {
            None
        }
    }

    /// Render using `value_type` for units and enumeration names.
    #[must_use]
    pub fn display_as(&self, value_type: ValueType) -> String {
        let value = self
            .value
            .as_ref()
            .map(|v| value_type.format_value(v))
            .unwrap_or_default();
        let mut out = match self.state {
            State::Unknown => "?".to_string(),
            State::Busy => format!("!{value}"),
            State::Valid => value,
        };
        if let Some(ts) = self.timestamp {
            out.push_str(" @");
            out.push_str(&ts.to_rfc3339());
        }
        out
    }
}

impl Default for ValueState {
    fn default() -> Self {
        Self::unknown(None)
    }
}

impl PartialEq for ValueState {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && (self.state == State::Unknown || self.value == other.value)
    }
}

impl fmt::Display for ValueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.as_ref().map(ToString::to_string).unwrap_or_default();
        match self.state {
            State::Unknown => f.write_str("?")?,
            State::Busy => write!(f, "!{value}")?,
            State::Valid => f.write_str(&value)?,
        }
        if let Some(ts) = self.timestamp {
            write!(f, " @{}", ts.to_rfc3339())?;
        }
        Ok(())
    }
}
