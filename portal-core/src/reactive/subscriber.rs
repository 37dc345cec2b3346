//! Subscriber types for the reactive store.
//!
//! A subscriber is a listener registered on a [`Store`](super::Store). Each one
//! gets a [`SubscriberId`] so it can be removed again, and the caller holds a
//! [`Subscription`] guard that performs the removal.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a subscriber.
///
/// Ids are handed out from a process-wide counter, so two listeners on two
/// different stores never compare equal either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A boxed store listener.
pub(crate) type Listener = Arc<dyn Fn() + Send + Sync>;

/// Guard returned by `subscribe`.
///
/// Dropping the guard removes the listener. Call [`Subscription::detach`] to
/// keep the listener registered for the store's whole lifetime.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    id: SubscriberId,
    unsubscribe: Option<Box<dyn FnOnce(SubscriberId) + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new<F>(id: SubscriberId, unsubscribe: F) -> Self
    where
        F: FnOnce(SubscriberId) + Send + Sync + 'static,
    {
        Self {
            id,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Get the subscriber ID this guard controls.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.run_unsubscribe();
    }

    /// Leave the listener registered and forget the guard.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }

    fn run_unsubscribe(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
