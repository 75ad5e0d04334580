//! Typed values and the resource types that constrain them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RcError, ValidationError};
use crate::time::Timestamp;

/// Enumerations known to the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumKind {
    /// Building usage: `day`, `night`, `away`, `vacation`.
    Use,
    /// Window contact: `closed`, `tilted`, `open`, `openOrTilted`.
    Window,
    /// Phone line: `idle`, `ringing`, `call`.
    Phone,
}

impl EnumKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Use => "use",
            Self::Window => "window",
            Self::Phone => "phone",
        }
    }

    /// Names of the enumeration's values, indexed by their integer value.
    #[must_use]
    pub fn variants(self) -> &'static [&'static str] {
        match self {
            Self::Use => &["day", "night", "away", "vacation"],
            Self::Window => &["closed", "tilted", "open", "openOrTilted"],
            Self::Phone => &["idle", "ringing", "call"],
        }
    }

    fn index_of(self, name: &str) -> Option<usize> {
        self.variants().iter().position(|v| *v == name)
    }
}

/// Storage representation of a [`ValueType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Bool,
    Int,
    Float,
    String,
    Time,
}

/// Declared type of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    Time,
    /// Float in percent, unit `%`.
    Percent,
    /// Float temperature, unit `°C`.
    Temp,
    Enum(EnumKind),
}

impl ValueType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Time => "time",
            Self::Percent => "percent",
            Self::Temp => "temp",
            Self::Enum(kind) => kind.name(),
        }
    }

    #[must_use]
    pub fn base(self) -> BaseType {
        match self {
            Self::Bool => BaseType::Bool,
            Self::Int | Self::Enum(_) => BaseType::Int,
            Self::Float | Self::Percent | Self::Temp => BaseType::Float,
            Self::String => BaseType::String,
            Self::Time => BaseType::Time,
        }
    }

    /// Unit suffix used when formatting and accepted when parsing.
    #[must_use]
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::Percent => Some("%"),
            Self::Temp => Some("°C"),
            _ => None,
        }
    }

    /// Whether hysteresis applies to values of this type.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Percent | Self::Temp)
    }

    fn mismatch(self, found: impl fmt::Display) -> RcError {
        RcError::TypeMismatch {
            expected: self,
            found: found.to_string(),
        }
    }

    /// Parse the textual representation of a value of this type.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::TypeMismatch`] when `text` is not a valid value.
    pub fn parse_value(self, text: &str) -> Result<Value, RcError> {
        let trimmed = text.trim();
        match self {
            Self::String => Ok(Value::String(text.to_string())),
            Self::Bool => match trimmed {
                "1" | "t" | "T" | "+" | "true" => Ok(Value::Bool(true)),
                "0" | "f" | "F" | "-" | "false" => Ok(Value::Bool(false)),
                _ => Err(self.mismatch(text)),
            },
            Self::Int => trimmed
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.mismatch(text)),
            Self::Float | Self::Percent | Self::Temp => {
                let number = self
                    .unit()
                    .and_then(|unit| trimmed.strip_suffix(unit))
                    .unwrap_or(trimmed)
                    .trim_end();
                number
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| self.mismatch(text))
            }
            Self::Enum(kind) => {
                let index = match kind.index_of(trimmed) {
                    Some(index) => index,
                    None => trimmed
                        .parse::<usize>()
                        .ok()
                        .filter(|i| *i < kind.variants().len())
                        .ok_or_else(|| self.mismatch(text))?,
                };
                i64::try_from(index)
                    .map(Value::Int)
                    .map_err(|_| self.mismatch(text))
            }
            Self::Time => DateTime::parse_from_rfc3339(trimmed)
                .map(|t| Value::Time(t.with_timezone(&Utc)))
                .map_err(|_| self.mismatch(text)),
        }
    }

    /// Format `value` including unit suffix or enumeration name.
    #[must_use]
    pub fn format_value(self, value: &Value) -> String {
        match (self, value) {
            (Self::Enum(kind), Value::Int(index)) => usize::try_from(*index)
                .ok()
                .and_then(|i| kind.variants().get(i))
                .map_or_else(|| value.to_string(), |name| (*name).to_string()),
            _ => match self.unit() {
                Some(unit) => format!("{value}{unit}"),
                None => value.to_string(),
            },
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "string" => Self::String,
            "time" => Self::Time,
            "percent" => Self::Percent,
            "temp" => Self::Temp,
            "use" => Self::Enum(EnumKind::Use),
            "window" => Self::Enum(EnumKind::Window),
            "phone" => Self::Enum(EnumKind::Phone),
            other => return Err(ValidationError::UnknownType(other.to_string())),
        })
    }
}

impl TryFrom<String> for ValueType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.name().to_string()
    }
}

/// A type-tagged value.
///
/// Enumeration values are stored as their index in [`Value::Int`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Time(Timestamp),
    String(String),
}

impl Value {
    #[must_use]
    pub fn base_type(&self) -> BaseType {
        match self {
            Self::Bool(_) => BaseType::Bool,
            Self::Int(_) => BaseType::Int,
            Self::Float(_) => BaseType::Float,
            Self::String(_) => BaseType::String,
            Self::Time(_) => BaseType::Time,
        }
    }

    /// Numeric view used by hysteresis and bool/number conversion.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(_) | Self::Time(_) => None,
        }
    }

    /// Convert to a value of type `target`.
    ///
    /// Strings are parsed by the target type, every value can be formatted
    /// into a string, and bool, int and float convert into each other.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::TypeMismatch`] when no conversion exists.
    #[allow(clippy::cast_possible_truncation)]
    pub fn convert(&self, target: ValueType) -> Result<Value, RcError> {
        if let (Self::String(text), false) = (self, target.base() == BaseType::String) {
            return target.parse_value(text);
        }
        let converted = match (target.base(), self) {
            (BaseType::String, _) => Some(Self::String(self.to_string())),
            (BaseType::Bool, Self::Bool(b)) => Some(Self::Bool(*b)),
            (BaseType::Bool, Self::Int(i)) => Some(Self::Bool(*i != 0)),
            (BaseType::Bool, Self::Float(f)) => Some(Self::Bool(*f != 0.0)),
            (BaseType::Int, Self::Bool(b)) => Some(Self::Int(i64::from(*b))),
            (BaseType::Int, Self::Int(i)) => Some(Self::Int(*i)),
            (BaseType::Int, Self::Float(f)) if f.is_finite() => Some(Self::Int(f.round() as i64)),
            (BaseType::Float, Self::Bool(_) | Self::Int(_) | Self::Float(_)) => {
                self.as_f64().map(Self::Float)
            }
            (BaseType::Time, Self::Time(t)) => Some(Self::Time(*t)),
            _ => None,
        };
        match (target, converted) {
            (ValueType::Enum(kind), Some(Self::Int(index))) => usize::try_from(index)
                .ok()
                .filter(|i| *i < kind.variants().len())
                .map(|_| Self::Int(index))
                .ok_or_else(|| target.mismatch(self)),
            (_, Some(value)) => Ok(value),
            (_, None) => Err(target.mismatch(self)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => {
                let text = v.to_string();
                if v.is_finite() && !text.contains('.') {
                    write!(f, "{text}.0")
                } else {
                    f.write_str(&text)
                }
            }
            Self::String(s) => f.write_str(s),
            Self::Time(t) => f.write_str(&t.to_rfc3339()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
