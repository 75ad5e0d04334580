//! Subscriber — a listener receiving change events for matching resources.
//!
//! A subscriber's interest (patterns and explicit resources) and its queue
//! live under one lock, so unsubscribing atomically stops delivery and
//! discards whatever was already queued.

use std::collections::{BTreeSet, VecDeque};
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use homerc_domain::error::RcError;
use homerc_domain::event::ChangeEvent;
use homerc_domain::id::{ResourceId, SubscriberId};
use homerc_domain::pattern::UriPattern;

/// Result of [`Subscriber::wait_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Event(ChangeEvent),
    /// [`Subscriber::interrupt`] was called.
    Interrupted,
    TimedOut,
    /// The directory shut down.
    Closed,
}

#[derive(Debug, Default)]
struct SubscriberState {
    patterns: Vec<UriPattern>,
    resources: BTreeSet<ResourceId>,
    queue: VecDeque<ChangeEvent>,
    interrupted: bool,
    closed: bool,
}

impl SubscriberState {
    fn wants(&self, event: &ChangeEvent) -> bool {
        self.resources.contains(&event.resource)
            || self.patterns.iter().any(|p| p.matches(&event.uri))
    }
}

/// State shared between a [`Subscriber`] handle and the event processor.
#[derive(Debug)]
pub(crate) struct SubscriberShared {
    pub id: SubscriberId,
    pub name: String,
    state: Mutex<SubscriberState>,
    notify: Notify,
}

impl SubscriberShared {
    pub fn new(name: String) -> Self {
        Self {
            id: SubscriberId::new(),
            name,
            state: Mutex::new(SubscriberState::default()),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SubscriberState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `event` if it matches. Returns whether it was queued.
    pub fn offer(&self, event: &ChangeEvent) -> bool {
        let mut state = self.lock();
        if state.closed || !state.wants(event) {
            return false;
        }
        state.queue.push_back(event.clone());
        drop(state);
        self.notify.notify_waiters();
        true
    }

    /// Discard pending events and wake every waiter with [`WaitOutcome::Closed`].
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.queue.clear();
        drop(state);
        self.notify.notify_waiters();
    }
}

/// Handle to a registered subscriber. Dropping it unregisters it.
#[derive(Debug)]
pub struct Subscriber {
    shared: Arc<SubscriberShared>,
    registry: Weak<Mutex<Vec<Arc<SubscriberShared>>>>,
}

impl Subscriber {
    pub(crate) fn new(
        shared: Arc<SubscriberShared>,
        registry: Weak<Mutex<Vec<Arc<SubscriberShared>>>>,
    ) -> Self {
        Self { shared, registry }
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.shared.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Receive events of the resource `id`.
    pub fn add_resource(&self, id: ResourceId) {
        self.shared.lock().resources.insert(id);
    }

    pub fn del_resource(&self, id: ResourceId) {
        self.shared.lock().resources.remove(&id);
    }

    /// Receive events of every resource matching one of the comma-separated
    /// `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::Validation`] if a pattern is malformed; no pattern
    /// is added in that case.
    pub fn add_pattern(&self, patterns: &str) -> Result<(), RcError> {
        let parsed = UriPattern::parse_list(patterns)?;
        let mut state = self.shared.lock();
        for pattern in parsed {
            if !state.patterns.iter().any(|p| p.as_str() == pattern.as_str()) {
                state.patterns.push(pattern);
            }
        }
        Ok(())
    }

    /// Remove previously added patterns.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::Validation`] if a pattern is malformed.
    pub fn del_pattern(&self, patterns: &str) -> Result<(), RcError> {
        let parsed = UriPattern::parse_list(patterns)?;
        let mut state = self.shared.lock();
        state
            .patterns
            .retain(|p| !parsed.iter().any(|d| d.as_str() == p.as_str()));
        Ok(())
    }

    #[must_use]
    pub fn patterns(&self) -> Vec<String> {
        self.shared
            .lock()
            .patterns
            .iter()
            .map(|p| p.as_str().to_string())
            .collect()
    }

    #[must_use]
    pub fn resources(&self) -> Vec<ResourceId> {
        self.shared.lock().resources.iter().copied().collect()
    }

    /// Drop every pattern and resource and discard queued events.
    pub fn unsubscribe_from_all(&self) {
        let mut state = self.shared.lock();
        state.patterns.clear();
        state.resources.clear();
        state.queue.clear();
    }

    /// Take the next event without waiting.
    #[must_use]
    pub fn poll_event(&self) -> Option<ChangeEvent> {
        self.shared.lock().queue.pop_front()
    }

    /// Wait for the next event, an interrupt, shutdown, or `timeout`.
    ///
    /// A pending interrupt is consumed and reported before queued events.
    pub async fn wait_event(&self, timeout: Option<Duration>) -> WaitOutcome {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let mut notified = pin!(self.shared.notify.notified());
            notified.as_mut().enable();
            {
                let mut state = self.shared.lock();
                if state.interrupted {
                    state.interrupted = false;
                    return WaitOutcome::Interrupted;
                }
                if let Some(event) = state.queue.pop_front() {
                    return WaitOutcome::Event(event);
                }
                if state.closed {
                    return WaitOutcome::Closed;
                }
            }
            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return WaitOutcome::TimedOut;
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Make the current or next [`wait_event`](Self::wait_event) return
    /// [`WaitOutcome::Interrupted`].
    pub fn interrupt(&self) {
        self.shared.lock().interrupted = true;
        self.shared.notify.notify_waiters();
    }

    /// Discard queued events. Returns how many were dropped.
    pub fn flush_events(&self) -> usize {
        let mut state = self.shared.lock();
        let dropped = state.queue.len();
        state.queue.clear();
        dropped
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.lock().queue.len()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|s| !Arc::ptr_eq(s, &self.shared));
        }
    }
}
