//! Resource — a typed slot owning its requests and current value-state.
//!
//! All mutation happens under the resource's own lock. Driver calls and
//! event dispatch happen while that lock is held, which keeps a resource's
//! value-state transitions totally ordered and delivered in that order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use homerc_domain::event::ChangeEvent;
use homerc_domain::id::ResourceId;
use homerc_domain::request::Request;
use homerc_domain::time::Timestamp;
use homerc_domain::uri::ResourceUri;
use homerc_domain::value::{Value, ValueType};
use homerc_domain::value_state::ValueState;

use crate::arbitration::{Arbitration, StoredRequest, hysteresis_hold, select_winner};
use crate::directory::Reporter;
use crate::event_processor::EventProcessor;
use crate::ports::{DriveOutcome, DriveTarget, Driver};

#[derive(Debug, Default)]
pub(crate) struct ResourceState {
    pub value_state: ValueState,
    pub requests: Vec<StoredRequest>,
    next_seq: u64,
    /// Value handed to the driver and not yet confirmed.
    in_flight: Option<Value>,
    /// Last value handed to the driver. Driven again only once the
    /// value-state has become unknown.
    driven: Option<Value>,
    last_actuation: Option<Timestamp>,
    deferred_until: Option<Timestamp>,
    detached: bool,
}

pub(crate) struct Resource {
    pub id: ResourceId,
    pub uri: ResourceUri,
    pub value_type: ValueType,
    pub writable: bool,
    driver: Arc<dyn Driver>,
    reporter: Reporter,
    reachable: Arc<AtomicBool>,
    state: Mutex<ResourceState>,
}

impl Resource {
    pub fn new(
        id: ResourceId,
        uri: ResourceUri,
        value_type: ValueType,
        writable: bool,
        driver: Arc<dyn Driver>,
        reporter: Reporter,
        reachable: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            uri,
            value_type,
            writable,
            driver,
            reporter,
            reachable,
            state: Mutex::new(ResourceState::default()),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ResourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    /// Insert or replace the request of `request.gid` and re-arbitrate.
    pub fn set_request(
        &self,
        request: Request,
        now: Timestamp,
        events: &EventProcessor,
    ) -> Arbitration {
        let mut state = self.lock();
        if state.detached {
            return Arbitration::Idle;
        }
        state.requests.retain(|stored| stored.request.gid != request.gid);
        let seq = state.next_seq;
        state.next_seq += 1;
        debug!(uri = %self.uri, request = %request, seq, "request set");
        state.requests.push(StoredRequest { request, seq });
        self.evaluate(&mut state, now, events)
    }

    pub fn del_request(&self, gid: &str, now: Timestamp, events: &EventProcessor) -> Arbitration {
        let mut state = self.lock();
        let before = state.requests.len();
        state.requests.retain(|stored| stored.request.gid != gid);
        if state.requests.len() != before {
            debug!(uri = %self.uri, gid, "request deleted");
        }
        self.evaluate(&mut state, now, events)
    }

    /// Shorten the window of the request of `gid` so that it ends at `t1`.
    pub fn del_request_at(
        &self,
        gid: &str,
        t1: Timestamp,
        now: Timestamp,
        events: &EventProcessor,
    ) -> Arbitration {
        let mut state = self.lock();
        if let Some(stored) = state.requests.iter_mut().find(|s| s.request.gid == gid) {
            let until = stored.request.valid_until.map_or(t1, |current| current.min(t1));
            stored.request.valid_until = Some(until);
            stored.request.repeat = None;
            debug!(uri = %self.uri, gid, until = %until, "request deletion scheduled");
        }
        self.evaluate(&mut state, now, events)
    }

    /// Re-arbitrate and, if needed, hand the winning value to the driver.
    pub fn evaluate(
        &self,
        state: &mut ResourceState,
        now: Timestamp,
        events: &EventProcessor,
    ) -> Arbitration {
        if state.detached {
            return Arbitration::Idle;
        }
        for stored in &mut state.requests {
            stored.request.advance(now);
        }
        let Some((target, hysteresis)) = select_winner(&state.requests, now)
            .map(|winner| (winner.request.value.clone(), winner.request.hysteresis))
        else {
            state.deferred_until = None;
            return Arbitration::Idle;
        };
        if !self.is_reachable() {
            state.deferred_until = None;
            return Arbitration::Queued;
        }
        if state.value_state.valid_value() == Some(&target)
            || state.in_flight.as_ref() == Some(&target)
            || (state.driven.as_ref() == Some(&target) && state.value_state.is_known())
        {
            state.deferred_until = None;
            return Arbitration::Unchanged;
        }
        if let Some(until) = hysteresis_hold(
            self.value_type,
            hysteresis,
            state.driven.as_ref(),
            &target,
            state.last_actuation,
            now,
        ) {
            debug!(uri = %self.uri, until = %until, "change held back by hysteresis");
            state.deferred_until = Some(until);
            return Arbitration::Deferred { until };
        }

        state.deferred_until = None;
        state.in_flight = Some(target.clone());
        state.driven = Some(target.clone());
        state.last_actuation = Some(now);
        debug!(uri = %self.uri, value = %target, "driving");
        let outcome = self.driver.drive(
            &DriveTarget {
                id: self.id,
                uri: &self.uri,
                value_type: self.value_type,
                reporter: &self.reporter,
            },
            &target,
        );
        match &outcome {
            DriveOutcome::Realized => {
                state.in_flight = None;
                self.set_value_state(state, ValueState::valid(target, now), now, events);
            }
            DriveOutcome::Reported(value) => {
                state.in_flight = None;
                let new = match value.convert(self.value_type) {
                    Ok(value) => ValueState::valid(value, now),
                    Err(err) => {
                        warn!(uri = %self.uri, error = %err, "driver reported incompatible value");
                        ValueState::unknown(Some(now))
                    }
                };
                self.set_value_state(state, new, now, events);
            }
            DriveOutcome::Busy => {
                let previous = state.value_state.value.clone();
                self.set_value_state(state, ValueState::busy(previous, now), now, events);
            }
            DriveOutcome::Failed => {
                warn!(uri = %self.uri, value = %target, "driver failed to realise value");
                state.in_flight = None;
                self.set_value_state(state, ValueState::unknown(Some(now)), now, events);
            }
            DriveOutcome::Silent => {}
        }
        Arbitration::Driven(outcome)
    }

    /// Apply a value-state reported by the driver. The value must already
    /// be converted to the declared type. While the host is unreachable the
    /// resource stays unknown whatever the driver reports.
    pub fn apply_report(&self, mut reported: ValueState, now: Timestamp, events: &EventProcessor) {
        let mut state = self.lock();
        if state.detached {
            return;
        }
        if !self.is_reachable() {
            debug!(uri = %self.uri, reported = %reported, "report ignored, host unreachable");
            state.in_flight = None;
            reported = ValueState::unknown(Some(now));
        } else if reported.is_busy() {
            if reported.value.is_none() {
                reported.value.clone_from(&state.value_state.value);
            }
        } else {
            state.in_flight = None;
        }
        self.set_value_state(&mut state, reported, now, events);
    }

    /// The owning host went away: the value becomes unknown, requests stay.
    pub fn mark_unreachable(&self, now: Timestamp, events: &EventProcessor) {
        let mut state = self.lock();
        if state.detached {
            return;
        }
        state.in_flight = None;
        state.deferred_until = None;
        self.set_value_state(&mut state, ValueState::unknown(Some(now)), now, events);
    }

    /// Purge dead requests and re-arbitrate. Returns the number purged.
    pub fn collect(&self, now: Timestamp, events: &EventProcessor) -> (usize, Arbitration) {
        let mut state = self.lock();
        for stored in &mut state.requests {
            stored.request.advance(now);
        }
        let before = state.requests.len();
        state.requests.retain(|stored| !stored.request.is_dead(now));
        let purged = before - state.requests.len();
        if purged > 0 {
            debug!(uri = %self.uri, purged, "dead requests purged");
        }
        let arbitration = self.evaluate(&mut state, now, events);
        (purged, arbitration)
    }

    /// Earliest instant at which re-arbitration may change the outcome.
    pub fn next_wakeup(&self, now: Timestamp) -> Option<Timestamp> {
        let state = self.lock();
        let boundaries = state.requests.iter().filter_map(|stored| {
            let mut request = stored.request.clone();
            request.advance(now);
            request.next_boundary(now)
        });
        boundaries.chain(state.deferred_until).min()
    }

    /// Cut the resource off after it was unregistered.
    pub fn detach(&self) {
        let mut state = self.lock();
        state.detached = true;
        state.requests.clear();
        state.in_flight = None;
        state.deferred_until = None;
    }

    pub fn snapshot(&self) -> (ValueState, Vec<Request>) {
        let state = self.lock();
        let mut requests: Vec<&StoredRequest> = state.requests.iter().collect();
        requests.sort_by_key(|stored| std::cmp::Reverse((stored.request.priority, stored.seq)));
        (
            state.value_state.clone(),
            requests.into_iter().map(|s| s.request.clone()).collect(),
        )
    }

    fn set_value_state(
        &self,
        state: &mut ResourceState,
        new: ValueState,
        now: Timestamp,
        events: &EventProcessor,
    ) {
        if state.value_state == new {
            state.value_state.timestamp = new.timestamp;
            return;
        }
        let old = std::mem::replace(&mut state.value_state, new.clone());
        debug!(uri = %self.uri, old = %old, new = %new, "value-state changed");
        events.dispatch(&ChangeEvent {
            resource: self.id,
            uri: self.uri.clone(),
            old,
            new,
            timestamp: now,
        });
    }
}
