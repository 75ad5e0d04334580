//! Request — a caller's prioritised, time-bounded desire for a value.

use std::fmt;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{RcError, ValidationError};
use crate::id::validate_identifier;
use crate::time::{Timestamp, format_duration, opt_duration_ms, parse_duration, parse_time};
use crate::value::Value;

/// Group id used when a textual request names none.
pub const DEFAULT_GID: &str = "default";

/// Request priority; higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const DEFAULT: Self = Self(0);
    pub const NORMAL: Self = Self(3);
    pub const USER: Self = Self(6);
    pub const STRONG: Self = Self(12);
    pub const MAX: Self = Self(15);
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request targeting one resource.
///
/// `priority == None` withdraws the request: it stays stored until the next
/// garbage collection but no longer takes part in arbitration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub gid: String,
    pub value: Value,
    pub priority: Option<Priority>,
    pub valid_from: Option<Timestamp>,
    pub valid_until: Option<Timestamp>,
    #[serde(with = "opt_duration_ms")]
    pub repeat: Option<TimeDelta>,
    #[serde(with = "opt_duration_ms")]
    pub hysteresis: Option<TimeDelta>,
    pub origin: Option<String>,
}

impl Request {
    /// Create a builder for a request of group `gid` asking for `value`.
    #[must_use]
    pub fn builder(gid: impl Into<String>, value: impl Into<Value>) -> RequestBuilder {
        RequestBuilder {
            request: Request {
                gid: gid.into(),
                value: value.into(),
                priority: Some(Priority::default()),
                valid_from: None,
                valid_until: None,
                repeat: None,
                hysteresis: None,
                origin: None,
            },
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::Validation`] for an invalid gid, a repeat interval
    /// shorter than one millisecond or a negative hysteresis.
    pub fn validate(&self) -> Result<(), RcError> {
        validate_identifier(&self.gid, false)?;
        if self.repeat.is_some_and(|r| r.num_milliseconds() < 1)
            || self.hysteresis.is_some_and(|h| h < TimeDelta::zero())
        {
            return Err(ValidationError::MalformedRequest(self.to_string()).into());
        }
        Ok(())
    }

    #[must_use]
    pub fn is_withdrawn(&self) -> bool {
        self.priority.is_none()
    }

    /// Whether the request takes part in arbitration at `now`.
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        !self.is_withdrawn()
            && self.valid_from.is_none_or(|t0| t0 <= now)
            && self.valid_until.is_none_or(|t1| now <= t1)
    }

    /// Move an elapsed repeating window to the period that is current at
    /// `now`. Returns whether the window moved.
    pub fn advance(&mut self, now: Timestamp) -> bool {
        let (Some(t1), Some(repeat)) = (self.valid_until, self.repeat) else {
            return false;
        };
        let period = repeat.num_milliseconds();
        if t1 >= now || period < 1 {
            return false;
        }
        let behind = (now - t1).num_milliseconds();
        let periods = behind.saturating_add(period - 1) / period;
        let Some(shift) = TimeDelta::try_milliseconds(periods.saturating_mul(period)) else {
            return false;
        };
        self.valid_from = self.valid_from.map(|t0| t0 + shift);
        self.valid_until = Some(t1 + shift);
        true
    }

    /// Whether the request can never become live again and must be purged.
    #[must_use]
    pub fn is_dead(&self, now: Timestamp) -> bool {
        self.is_withdrawn()
            || (self.repeat.is_none() && self.valid_until.is_some_and(|t1| t1 < now))
    }

    /// Next instant after `now` at which liveness may change.
    #[must_use]
    pub fn next_boundary(&self, now: Timestamp) -> Option<Timestamp> {
        if self.is_withdrawn() {
            return None;
        }
        if let Some(t0) = self.valid_from.filter(|t0| *t0 > now) {
            return Some(t0);
        }
        self.valid_until
            .filter(|t1| *t1 >= now)
            .map(|t1| t1 + TimeDelta::milliseconds(1))
    }

    /// Parse the textual request syntax
    /// `<value> [#<gid>] [*<prio>] [+[<repeat>+]<t0>] [-<t1>] [~<hysteresis>] [@<origin>]`.
    ///
    /// The value is kept as a string; it is converted to the resource type
    /// when the request is submitted. Times are RFC 3339 or an offset from
    /// `now` such as `30m`. An empty repeat (`++<t0>`) means one day.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::Validation`] when the text is malformed.
    pub fn parse(text: &str, now: Timestamp) -> Result<Self, RcError> {
        let malformed = || ValidationError::MalformedRequest(text.to_string());
        let mut tokens = text.split_whitespace();
        let value = tokens.next().ok_or_else(malformed)?;
        let mut builder = Request::builder(DEFAULT_GID, value);
        for token in tokens {
            let mut chars = token.chars();
            let Some(tag) = chars.next() else { continue };
            let arg = chars.as_str();
            builder = match tag {
                '#' => builder.gid(arg),
                '*' if arg == "-" => builder.withdrawn(),
                '*' => builder.priority(Priority(arg.parse().map_err(|_| malformed())?)),
                '+' => {
                    let (repeat, t0) = match arg.strip_prefix('+') {
                        Some(t0) => (Some(TimeDelta::days(1)), t0),
                        None => match arg.split_once('+') {
                            Some((repeat, t0)) if parse_duration(repeat).is_ok() => {
                                (parse_duration(repeat).ok(), t0)
                            }
                            _ => (None, arg),
                        },
                    };
                    let builder = builder.valid_from(parse_time(t0, now)?);
                    match repeat {
                        Some(repeat) => builder.repeat(repeat),
                        None => builder,
                    }
                }
                '-' => builder.valid_until(parse_time(arg, now)?),
                '~' => builder.hysteresis(parse_duration(arg)?),
                '@' => builder.origin(arg),
                _ => return Err(malformed().into()),
            };
        }
        builder.build()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.value, self.gid)?;
        match self.priority {
            Some(priority) => write!(f, " *{priority}")?,
            None => f.write_str(" *-")?,
        }
        if let Some(t0) = self.valid_from {
            f.write_str(" +")?;
            if let Some(repeat) = self.repeat {
                if repeat == TimeDelta::days(1) {
                    f.write_str("+")?;
                } else {
                    write!(f, "{}+", format_duration(repeat))?;
                }
            }
            f.write_str(&t0.to_rfc3339())?;
        }
        if let Some(t1) = self.valid_until {
            write!(f, " -{}", t1.to_rfc3339())?;
        }
        if let Some(hysteresis) = self.hysteresis {
            write!(f, " ~{}", format_duration(hysteresis))?;
        }
        if let Some(origin) = &self.origin {
            write!(f, " @{origin}")?;
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Request`].
#[derive(Debug)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    #[must_use]
    pub fn gid(mut self, gid: impl Into<String>) -> Self {
        self.request.gid = gid.into();
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.request.value = value.into();
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.request.priority = Some(priority);
        self
    }

    /// Turn the request into a withdrawal.
    #[must_use]
    pub fn withdrawn(mut self) -> Self {
        self.request.priority = None;
        self
    }

    #[must_use]
    pub fn valid_from(mut self, t0: Timestamp) -> Self {
        self.request.valid_from = Some(t0);
        self
    }

    #[must_use]
    pub fn valid_until(mut self, t1: Timestamp) -> Self {
        self.request.valid_until = Some(t1);
        self
    }

    #[must_use]
    pub fn repeat(mut self, repeat: TimeDelta) -> Self {
        self.request.repeat = Some(repeat);
        self
    }

    #[must_use]
    pub fn hysteresis(mut self, hysteresis: TimeDelta) -> Self {
        self.request.hysteresis = Some(hysteresis);
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.request.origin = Some(origin.into());
        self
    }

    /// Consume the builder, validate, and return a [`Request`].
    ///
    /// # Errors
    ///
    /// Returns [`RcError::Validation`] if the request is invalid.
    pub fn build(self) -> Result<Request, RcError> {
        self.request.validate()?;
        Ok(self.request)
    }
}
