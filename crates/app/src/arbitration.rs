//! Arbitration — choosing one winning request among a resource's requests.
//!
//! The winner is the live request with the highest priority. Ties go to the
//! most recently submitted request, identified by a per-resource sequence
//! number taken under the resource lock, so the result depends only on
//! (priority, submission order).

use chrono::TimeDelta;

use homerc_domain::request::Request;
use homerc_domain::time::Timestamp;
use homerc_domain::value::{Value, ValueType};

use crate::ports::DriveOutcome;

/// Result of re-arbitrating a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Arbitration {
    /// No request is live; the driver-reported value governs.
    Idle,
    /// The winning value is already realised or being realised.
    Unchanged,
    /// The driver was asked to realise the winning value.
    Driven(DriveOutcome),
    /// A numeric flip was held back by hysteresis until `until`.
    Deferred { until: Timestamp },
    /// The owning host is unreachable; requests stay queued.
    Queued,
}

/// A request as stored on a resource, tagged with its submission order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredRequest {
    pub request: Request,
    pub seq: u64,
}

/// Select the winning request at `now`.
pub(crate) fn select_winner(requests: &[StoredRequest], now: Timestamp) -> Option<&StoredRequest> {
    requests
        .iter()
        .filter(|stored| stored.request.is_live(now))
        .max_by_key(|stored| (stored.request.priority, stored.seq))
}

/// When a change to `target` must wait for the hysteresis interval of the
/// winning request, return the instant it may be applied.
///
/// Only numeric types are held back, and only when the value would flip
/// away from the last driven value within `hysteresis` of that actuation.
pub(crate) fn hysteresis_hold(
    value_type: ValueType,
    hysteresis: Option<TimeDelta>,
    driven: Option<&Value>,
    target: &Value,
    last_actuation: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    if !value_type.is_numeric() {
        return None;
    }
    let (Some(hysteresis), Some(driven), Some(last)) = (hysteresis, driven, last_actuation) else {
        return None;
    };
    let until = last + hysteresis;
    (driven != target && now < until).then_some(until)
}
