//! Binding accessor for external reactive frameworks.
//!
//! A presentation layer that re-renders on change needs three things from a
//! source: the current snapshot, a stable creation-time snapshot, and a way to
//! hear about replacements. [`ExternalStore`] is that seam.

use std::sync::Arc;

use super::subscriber::Subscription;

/// A source of immutable snapshots that can be observed.
pub trait ExternalStore {
    /// The snapshot type.
    type Snapshot: ?Sized;

    /// Get the current snapshot.
    fn snapshot(&self) -> Arc<Self::Snapshot>;

    /// Get the snapshot the source was created with.
    ///
    /// Always the same reference, whatever has happened since.
    fn initial_snapshot(&self) -> Arc<Self::Snapshot>;

    /// Register a listener for snapshot replacements.
    fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static;
}

/// A reader that remembers the last snapshot it handed out.
///
/// This is the render-side half of a binding: call [`Binding::read`] on each
/// render and re-render children only when it reports a change.
pub struct Binding<B>
where
    B: ExternalStore,
{
    source: B,
    seen: Arc<B::Snapshot>,
}

impl<B> Binding<B>
where
    B: ExternalStore,
{
    /// Bind to `source`, starting from its initial snapshot.
    pub fn new(source: B) -> Self {
        let seen = source.initial_snapshot();
        Self { source, seen }
    }

    /// Read the current snapshot.
    ///
    /// Returns the snapshot and whether it differs (by reference) from the
    /// one returned by the previous call.
    pub fn read(&mut self) -> (Arc<B::Snapshot>, bool) {
        let current = self.source.snapshot();
        let changed = !Arc::ptr_eq(&current, &self.seen);
        self.seen = Arc::clone(&current);
        (current, changed)
    }

    /// The last snapshot returned by `read`, or the initial one.
    pub fn last_seen(&self) -> Arc<B::Snapshot> {
        Arc::clone(&self.seen)
    }

    /// The source this binding reads from.
    pub fn source(&self) -> &B {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Store;

    #[test]
    fn binding_reports_reference_changes_only() {
        let store = Store::new(1);
        let mut binding = Binding::new(store.clone());

        let (value, changed) = binding.read();
        assert_eq!(*value, 1);
        assert!(!changed);

        store.set(|_| Arc::new(2));
        let (value, changed) = binding.read();
        assert_eq!(*value, 2);
        assert!(changed);

        let (_, changed) = binding.read();
        assert!(!changed);
    }

    #[test]
    fn binding_starts_from_initial_snapshot() {
        let store = Store::new(String::from("first"));
        store.set(|_| Arc::new(String::from("second")));

        let binding = Binding::new(store.clone());
        assert!(Arc::ptr_eq(&binding.last_seen(), &store.initial()));
    }
}
