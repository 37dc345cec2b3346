//! Lifecycle Registry
//!
//! The registry owns the ordered list of live entries. It is built on a
//! single [`Store`] whose snapshot is `Vec<Entry<C>>`.
//!
//! # Lifecycle
//!
//! 1. `show` creates a key, a handle and an entry together, and appends the
//!    entry.
//!
//! 2. The entry's own handle may replace its content in place, any number of
//!    times, while it is live.
//!
//! 3. The first `resolve` or `reject` on that handle removes the entry.
//!
//! Nothing else touches the list. There is no public remove: an entry that
//! disappeared without settling would leave a handle that looks pending
//! forever.
//!
//! Every change builds a new `Vec`. Operations that find nothing to do return
//! the current snapshot unchanged, so subscribers are not notified.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::handle::{ErasedHandle, Handle, PendingSlot};
use super::key::{EntryKey, RegistryId};
use super::outlet::Outlet;
use super::scope::{self, HandleScope};
use crate::config::PortalConfig;
use crate::error::{PortalError, Rejection};
use crate::reactive::{Store, Subscription};

/// One live unit of content and the handle it was shown with.
pub struct Entry<C> {
    key: EntryKey,
    registry: RegistryId,
    content: Arc<C>,
    handle: ErasedHandle,
    pending: PendingSlot,
}

impl<C> Entry<C>
where
    C: Send + Sync + 'static,
{
    /// The entry's key. Stable for the entry's whole life.
    pub fn key(&self) -> EntryKey {
        self.key
    }

    /// The current content.
    pub fn content(&self) -> &C {
        &self.content
    }

    /// The current content as a shared pointer.
    pub fn content_arc(&self) -> Arc<C> {
        Arc::clone(&self.content)
    }

    /// Render this entry's content with its handle in ambient scope.
    ///
    /// Anything `f` calls can retrieve the handle with
    /// [`Registry::current_handle`].
    pub fn render<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        let _scope = HandleScope::enter(self.registry, self.handle.clone());
        f(&self.content)
    }

    /// The entry's handle, if it was created with these type parameters.
    pub fn handle<T, E>(&self) -> Result<Handle<C, T, E>, PortalError>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        self.handle.downcast()
    }

    fn with_content(&self, content: C) -> Self {
        Self {
            key: self.key,
            registry: self.registry,
            content: Arc::new(content),
            handle: self.handle.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<C> Clone for Entry<C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            registry: self.registry,
            content: Arc::clone(&self.content),
            handle: self.handle.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for Entry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("content", &self.content)
            .finish()
    }
}

pub(crate) struct RegistryInner<C>
where
    C: Send + Sync + 'static,
{
    id: RegistryId,
    label: String,
    capacity_hint: usize,
    store: Store<Vec<Entry<C>>>,
}

impl<C> RegistryInner<C>
where
    C: Send + Sync + 'static,
{
    pub(crate) fn id(&self) -> RegistryId {
        self.id
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    fn insert(&self, entry: Entry<C>) {
        self.store.set(|entries| {
            let mut next = Vec::with_capacity((entries.len() + 1).max(self.capacity_hint));
            next.extend(entries.iter().cloned());
            next.push(entry);
            Arc::new(next)
        });
    }

    /// Swap the content of `key` in place. Returns `false` if it is gone.
    pub(crate) fn replace(&self, key: EntryKey, content: C) -> bool {
        let replaced = self.store.set(|entries| {
            let Some(position) = entries.iter().position(|entry| entry.key == key) else {
                return Arc::clone(entries);
            };
            let mut next = Vec::with_capacity(entries.len().max(self.capacity_hint));
            next.extend(entries.iter().cloned());
            next[position] = entries[position].with_content(content);
            Arc::new(next)
        });

        if replaced {
            trace!(registry = %self.label, key = %key, "entry content replaced");
        } else {
            trace!(registry = %self.label, key = %key, "update for missing entry discarded");
        }
        replaced
    }

    /// Drop the entry for `key`. Returns `false` if it is already gone.
    pub(crate) fn remove(&self, key: EntryKey) -> bool {
        self.store.set(|entries| {
            if !entries.iter().any(|entry| entry.key == key) {
                return Arc::clone(entries);
            }
            let mut next = Vec::with_capacity(entries.len().max(self.capacity_hint));
            next.extend(entries.iter().filter(|entry| entry.key != key).cloned());
            Arc::new(next)
        })
    }
}

/// An ordered, keyed collection of live portal entries.
///
/// Cloning a registry shares its state.
pub struct Registry<C>
where
    C: Send + Sync + 'static,
{
    inner: Arc<RegistryInner<C>>,
}

impl<C> Registry<C>
where
    C: Send + Sync + 'static,
{
    /// Create an empty registry.
    pub fn new(config: PortalConfig) -> Self {
        let id = RegistryId::new();
        debug!(registry = %config.label, "portal registry created");

        Self {
            inner: Arc::new(RegistryInner {
                id,
                store: Store::new(Vec::with_capacity(config.capacity_hint)),
                capacity_hint: config.capacity_hint,
                label: config.label,
            }),
        }
    }

    /// The registry's identity.
    pub fn id(&self) -> RegistryId {
        self.inner.id
    }

    /// The label from the registry's config.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Show `content` and return the handle that controls it.
    pub fn show<T>(&self, content: C) -> Handle<C, T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.show_fallible(content)
    }

    /// Show content built from its own handle.
    pub fn show_with<T, F>(&self, build: F) -> Handle<C, T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&Handle<C, T>) -> C,
    {
        self.show_fallible_with(build)
    }

    /// Show `content` with an application-chosen rejection type `E`.
    pub fn show_fallible<T, E>(&self, content: C) -> Handle<C, T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        self.show_fallible_with(move |_| content)
    }

    /// Show content built from its own handle, with rejection type `E`.
    pub fn show_fallible_with<T, E, F>(&self, build: F) -> Handle<C, T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce(&Handle<C, T, E>) -> C,
    {
        let key = EntryKey::new();
        let (handle, pending) = Handle::new(key, Arc::downgrade(&self.inner));
        let content = build(&handle);

        self.inner.insert(Entry {
            key,
            registry: self.inner.id,
            content: Arc::new(content),
            handle: handle.erase(),
            pending,
        });
        debug!(registry = %self.inner.label, key = %key, "entry shown");

        handle
    }

    /// The live entries, in the order they were shown.
    pub fn entries(&self) -> Arc<Vec<Entry<C>>> {
        self.inner.store.get()
    }

    /// The live contents, in the order they were shown.
    pub fn contents(&self) -> Vec<Arc<C>> {
        self.entries().iter().map(Entry::content_arc).collect()
    }

    /// The live keys, in the order they were shown.
    pub fn keys(&self) -> Vec<EntryKey> {
        self.entries().iter().map(Entry::key).collect()
    }

    /// Whether an entry with `key` is live.
    pub fn contains(&self, key: EntryKey) -> bool {
        self.entries().iter().any(|entry| entry.key == key)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Listen for changes to the entry list.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    /// The presentation surface for this registry.
    pub fn outlet(&self) -> Outlet<C> {
        Outlet::new(self.clone(), self.inner.store.clone())
    }

    /// The handle of the entry whose content is rendering right now.
    ///
    /// Fails with [`PortalError::MissingContext`] outside every entry of
    /// this registry.
    pub fn current_handle<T>(&self) -> Result<Handle<C, T>, PortalError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.current_handle_fallible::<T, Rejection>()
    }

    /// [`Registry::current_handle`] for handles with rejection type `E`.
    pub fn current_handle_fallible<T, E>(&self) -> Result<Handle<C, T, E>, PortalError>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        HandleScope::nearest(self.inner.id)
            .ok_or_else(|| PortalError::MissingContext {
                registry: self.inner.label.clone(),
            })?
            .downcast()
    }

    /// Run `f` as if rendering inside the entry for `key`.
    ///
    /// Returns `None` if no such entry is live.
    pub fn within_entry<R>(&self, key: EntryKey, f: impl FnOnce(&C) -> R) -> Option<R> {
        let entries = self.entries();
        let entry = entries.iter().find(|entry| entry.key == key)?;
        Some(scope::with_scope(self.inner.id, entry.handle.clone(), || {
            f(&entry.content)
        }))
    }
}

impl<C> Clone for Registry<C>
where
    C: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> fmt::Debug for Registry<C>
where
    C: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("label", &self.inner.label)
            .field("len", &self.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn registry() -> Registry<&'static str> {
        Registry::new(PortalConfig::default())
    }

    fn contents(registry: &Registry<&'static str>) -> Vec<&'static str> {
        registry.contents().iter().map(|c| **c).collect()
    }

    #[test]
    fn show_appends_in_call_order() {
        let registry = registry();
        let a = registry.show::<()>("A");
        let b = registry.show::<()>("B");
        let c = registry.show::<()>("C");

        assert_eq!(contents(&registry), vec!["A", "B", "C"]);
        assert_eq!(registry.keys(), vec![a.key(), b.key(), c.key()]);
    }

    #[test]
    fn settlement_removes_only_its_slot() {
        let registry = registry();
        let _a = registry.show::<()>("A");
        let b = registry.show::<()>("B");
        let _c = registry.show::<()>("C");

        b.resolve(());
        assert_eq!(contents(&registry), vec!["A", "C"]);
        assert!(!registry.contains(b.key()));
    }

    #[test]
    fn update_replaces_in_place() {
        let registry = registry();
        let _a = registry.show::<()>("A");
        let b = registry.show::<()>("B");
        let _c = registry.show::<()>("C");

        b.update("B2");
        assert_eq!(contents(&registry), vec!["A", "B2", "C"]);
        assert_eq!(registry.keys()[1], b.key());

        let entries = registry.entries();
        let same = entries[1].handle::<(), Rejection>().unwrap();
        assert!(same.same_handle(&b));
    }

    #[test]
    fn update_after_settlement_is_inert() {
        let registry = registry();
        let a = registry.show::<()>("A");
        a.resolve(());

        let notified = Arc::new(AtomicI32::new(0));
        let notified_clone = notified.clone();
        let _sub = registry.subscribe(move || {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        a.update("A2");
        assert!(registry.is_empty());
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn double_settlement_notifies_once() {
        let registry = registry();
        let a = registry.show::<()>("A");

        let notified = Arc::new(AtomicI32::new(0));
        let notified_clone = notified.clone();
        let _sub = registry.subscribe(move || {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        a.resolve(());
        a.resolve(());
        a.cancel();
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn show_with_content_sees_its_handle() {
        let registry: Registry<String> = Registry::new(PortalConfig::default());
        let handle = registry.show_with::<(), _>(|handle| format!("dialog {}", handle.key()));

        assert_eq!(*registry.contents()[0], format!("dialog {}", handle.key()));
    }

    #[test]
    fn current_handle_outside_entries_is_missing_context() {
        let registry = registry();
        let _a = registry.show::<()>("A");

        let error = registry.current_handle::<()>().unwrap_err();
        assert_eq!(
            error,
            PortalError::MissingContext {
                registry: "portal".to_string()
            }
        );
    }

    #[test]
    fn render_publishes_the_entry_handle() {
        let registry = registry();
        let shown = registry.show::<i32>("A");

        let entries = registry.entries();
        let found = entries[0].render(|content| {
            assert_eq!(*content, "A");
            registry.current_handle::<i32>().unwrap()
        });
        assert!(found.same_handle(&shown));
    }

    #[test]
    fn current_handle_with_wrong_types_is_mismatch() {
        let registry = registry();
        let shown = registry.show::<i32>("A");

        let result = registry.within_entry(shown.key(), |_| registry.current_handle::<String>());
        assert!(matches!(
            result,
            Some(Err(PortalError::HandleTypeMismatch { .. }))
        ));
    }

    #[test]
    fn within_entry_for_settled_key_is_none() {
        let registry = registry();
        let shown = registry.show::<()>("A");
        shown.resolve(());

        assert!(registry.within_entry(shown.key(), |_| ()).is_none());
    }

    #[test]
    fn settling_from_rendered_content_removes_entry() {
        let registry = registry();
        let _a = registry.show::<bool>("A");
        let b = registry.show::<bool>("B");

        let entries = registry.entries();
        entries[1].render(|_| {
            registry.current_handle::<bool>().unwrap().resolve(true);
        });

        assert_eq!(contents(&registry), vec!["A"]);
        assert_eq!(b.try_outcome(), Some(Ok(true)));
    }

    #[test]
    fn length_tracks_shows_minus_settlements() {
        let registry = registry();
        let handles: Vec<_> = (0..10).map(|_| registry.show::<usize>("x")).collect();

        for (n, handle) in handles.iter().enumerate().filter(|(n, _)| n % 3 == 0) {
            handle.resolve(n);
        }

        let expected: Vec<_> = handles
            .iter()
            .enumerate()
            .filter(|(n, _)| n % 3 != 0)
            .map(|(_, handle)| handle.key())
            .collect();
        assert_eq!(registry.len(), 10 - 4);
        assert_eq!(registry.keys(), expected);
    }

    #[test]
    fn every_snapshot_keeps_the_capacity_hint() {
        let registry: Registry<&'static str> = Registry::new(PortalConfig {
            capacity_hint: 16,
            ..PortalConfig::default()
        });
        let a = registry.show::<()>("A");
        let _b = registry.show::<()>("B");
        assert!(registry.entries().capacity() >= 16);

        a.update("A2");
        assert!(registry.entries().capacity() >= 16);

        a.resolve(());
        assert_eq!(contents(&registry), vec!["B"]);
        assert!(registry.entries().capacity() >= 16);
    }
}
