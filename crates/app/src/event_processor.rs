//! Event processor — fans change events out to matching subscribers.
//!
//! Each subscriber has its own FIFO queue. Dispatch is called while the
//! originating resource is locked, so events of one resource reach every
//! queue in the order the resource changed. No order is kept across
//! resources.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use homerc_domain::error::RcError;
use homerc_domain::event::ChangeEvent;
use homerc_domain::id::validate_identifier;

use crate::subscriber::{Subscriber, SubscriberShared};

/// The subscriber list and dispatch entry point.
#[derive(Debug, Clone, Default)]
pub struct EventProcessor {
    subscribers: Arc<Mutex<Vec<Arc<SubscriberShared>>>>,
}

impl EventProcessor {
    fn lock(&self) -> MutexGuard<'_, Vec<Arc<SubscriberShared>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscriber called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RcError::DuplicateId`] if the name is taken and
    /// [`RcError::Validation`] if it is not a valid identifier.
    pub fn subscribe(&self, name: &str) -> Result<Subscriber, RcError> {
        validate_identifier(name, false)?;
        let mut subscribers = self.lock();
        if subscribers.iter().any(|s| s.name == name) {
            return Err(RcError::DuplicateId {
                kind: "subscriber",
                id: name.to_string(),
            });
        }
        let shared = Arc::new(SubscriberShared::new(name.to_string()));
        subscribers.push(Arc::clone(&shared));
        debug!(subscriber = name, "subscriber registered");
        Ok(Subscriber::new(shared, Arc::downgrade(&self.subscribers)))
    }

    /// Queue `event` on every matching subscriber. Returns the number of
    /// subscribers it was queued on.
    pub fn dispatch(&self, event: &ChangeEvent) -> usize {
        let delivered = self
            .lock()
            .iter()
            .filter(|subscriber| subscriber.offer(event))
            .count();
        trace!(uri = %event.uri, delivered, "event dispatched");
        delivered
    }

    #[must_use]
    pub fn subscriber_names(&self) -> Vec<String> {
        self.lock().iter().map(|s| s.name.clone()).collect()
    }

    /// Close every subscriber, discarding queued events.
    pub fn close_all(&self) {
        let subscribers = std::mem::take(&mut *self.lock());
        for subscriber in &subscribers {
            subscriber.close();
        }
        debug!(count = subscribers.len(), "subscribers closed");
    }
}
