//! Store Implementation
//!
//! A Store holds one immutable snapshot behind an `Arc` and tells its
//! listeners when that snapshot is replaced.
//!
//! # How Stores Work
//!
//! 1. `set` hands the current snapshot to an updater and receives the next
//!    one back.
//!
//! 2. If the updater returned the very same `Arc`, nothing happened: no
//!    replacement, no notification.
//!
//! 3. Otherwise the snapshot is swapped and every listener runs, in
//!    subscription order, before `set` returns.
//!
//! Change detection is pointer identity only. State transitions must build a
//! new value rather than mutating the old one in place.
//!
//! # Notification Cycles
//!
//! The listener list is copied when a notification starts. A listener added
//! while the cycle runs is not called for that cycle. A listener removed while
//! the cycle runs is skipped if its turn has not come yet.
//!
//! # Thread Safety
//!
//! The compare-and-replace step runs under a mutex, so concurrent `set` calls
//! are serialised. Listeners run after that lock is released, which lets a
//! listener call `set` again without deadlocking.

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::trace;

use super::binding::ExternalStore;
use super::subscriber::{Listener, SubscriberId, Subscription};

struct StoreInner<S: ?Sized> {
    /// The creation-time snapshot, kept for `initial()`.
    initial: Arc<S>,

    /// The live snapshot. Also the serialisation point for `set`.
    current: Mutex<Arc<S>>,

    /// Listeners in subscription order.
    listeners: RwLock<IndexMap<SubscriberId, Listener>>,
}

/// An observable container for one immutable snapshot of type `S`.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use portal_core::reactive::Store;
///
/// let store = Store::new(vec![1, 2]);
/// let changed = store.set(|items| {
///     let mut next = items.as_ref().clone();
///     next.push(3);
///     Arc::new(next)
/// });
///
/// assert!(changed);
/// assert_eq!(*store.get(), vec![1, 2, 3]);
/// ```
pub struct Store<S: ?Sized> {
    inner: Arc<StoreInner<S>>,
}

impl<S> Store<S>
where
    S: Send + Sync + 'static,
{
    /// Create a new store with the given initial value.
    pub fn new(initial: S) -> Self {
        Self::from_arc(Arc::new(initial))
    }
}

impl<S> Store<S>
where
    S: ?Sized + Send + Sync + 'static,
{
    /// Create a store whose initial snapshot is the given `Arc`.
    ///
    /// `initial()` keeps returning this exact reference.
    pub fn from_arc(initial: Arc<S>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                current: Mutex::new(Arc::clone(&initial)),
                initial,
                listeners: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Get the current snapshot.
    pub fn get(&self) -> Arc<S> {
        Arc::clone(&self.inner.current.lock())
    }

    /// Get the snapshot the store was created with.
    pub fn initial(&self) -> Arc<S> {
        Arc::clone(&self.inner.initial)
    }

    /// Replace the snapshot with `updater(current)`.
    ///
    /// Returns `true` if the snapshot changed and listeners were notified.
    /// The updater runs with the store locked and must not touch this store.
    pub fn set<F>(&self, updater: F) -> bool
    where
        F: FnOnce(&Arc<S>) -> Arc<S>,
    {
        {
            let mut current = self.inner.current.lock();
            let next = updater(&current);
            if Arc::ptr_eq(&next, &current) {
                return false;
            }
            *current = next;
        }

        self.notify_subscribers();
        true
    }

    /// Register a listener that runs after each snapshot replacement.
    ///
    /// The listener is removed when the returned guard is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        self.inner
            .listeners
            .write()
            .insert(id, Arc::new(listener));

        let weak: Weak<StoreInner<S>> = Arc::downgrade(&self.inner);
        Subscription::new(id, move |id| {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.write().shift_remove(&id);
            }
        })
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Check whether two stores share the same state.
    pub fn same_store(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify_subscribers(&self) {
        let listeners: Vec<(SubscriberId, Listener)> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        trace!(listeners = listeners.len(), "store snapshot replaced");

        for (id, listener) in listeners {
            // Removed earlier in this cycle.
            if !self.inner.listeners.read().contains_key(&id) {
                continue;
            }
            listener();
        }
    }
}

impl<S: ?Sized> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> ExternalStore for Store<S>
where
    S: ?Sized + Send + Sync + 'static,
{
    type Snapshot = S;

    fn snapshot(&self) -> Arc<S> {
        self.get()
    }

    fn initial_snapshot(&self) -> Arc<S> {
        self.initial()
    }

    fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        Store::subscribe(self, listener)
    }
}

impl<S> fmt::Debug for Store<S>
where
    S: ?Sized + fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &self.get())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
