//! Handle Implementation
//!
//! A Handle is what `show` returns. It is both a one-shot future (the entry's
//! eventual result) and a control surface (resolve, reject, update) that
//! stays usable until the entry settles.
//!
//! # How Handles Work
//!
//! The two roles live in two objects:
//!
//! - [`Deferred`] is the one-shot computation. The sending half of a
//!   `tokio::sync::oneshot` channel sits in a slot that settlement empties;
//!   the receiving half is wrapped in `Shared` so any number of clones can
//!   await the same outcome.
//!
//! - [`Handle`] is a cheap, cloneable reference to the deferred plus the
//!   entry key and a weak link back to the registry that owns the entry.
//!
//! Settlement takes the sender out of its slot, so exactly one `resolve` or
//! `reject` ever wins. Every later call finds the slot empty and does nothing.
//!
//! The slot itself is owned by the entry, not by the handle. The deferred
//! only holds a weak reference to it. Dropping the registry drops its entries
//! and with them every unsent sender, so pending awaits end with
//! [`HandleError::Abandoned`] even while callers still hold their handles.

use std::any::{type_name, Any};
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures_util::future::{FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::key::EntryKey;
use super::registry::RegistryInner;
use super::scope;
use crate::error::{HandleError, PortalError, Rejection};

type Outcome<T, E> = Result<T, E>;

type SenderSlot<T, E> = Mutex<Option<oneshot::Sender<Outcome<T, E>>>>;

/// Type-erased owner of a deferred's sender slot, kept by the entry.
pub(crate) type PendingSlot = Arc<dyn Any + Send + Sync>;

/// The one-shot computation behind a handle.
pub(crate) struct Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    sender: Weak<SenderSlot<T, E>>,
    receiver: Shared<oneshot::Receiver<Outcome<T, E>>>,
    settled: AtomicBool,
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// A fresh deferred and the strong owner of its sender slot.
    fn new() -> (Self, Arc<SenderSlot<T, E>>) {
        let (sender, receiver) = oneshot::channel();
        let slot = Arc::new(Mutex::new(Some(sender)));
        let deferred = Self {
            sender: Arc::downgrade(&slot),
            receiver: receiver.shared(),
            settled: AtomicBool::new(false),
        };
        (deferred, slot)
    }

    /// Deliver `outcome` if nothing has been delivered yet.
    ///
    /// Returns `true` for the call that settled the deferred. Returns `false`
    /// once the slot's owner is gone: the outcome is already `Abandoned`.
    fn settle(&self, outcome: Outcome<T, E>) -> bool {
        let Some(slot) = self.sender.upgrade() else {
            return false;
        };
        let sender = {
            let mut slot = slot.lock();
            let Some(sender) = slot.take() else {
                return false;
            };
            self.settled.store(true, Ordering::SeqCst);
            sender
        };

        // The receiver is owned by `self`, so the send cannot fail.
        let _ = sender.send(outcome);
        true
    }

    fn is_settled(&self) -> bool {
        self.settled.load(Ordering::SeqCst)
    }
}

pub(crate) struct HandleInner<C, T, E>
where
    C: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    key: EntryKey,
    registry: Weak<RegistryInner<C>>,
    deferred: Deferred<T, E>,
}

/// Control handle for one portal entry.
///
/// # Type Parameters
///
/// - `C`: the registry's content type.
/// - `T`: the value the entry resolves with.
/// - `E`: the value the entry rejects with. Defaults to [`Rejection`].
///
/// # Example
///
/// ```rust
/// use portal_core::create_imperative_portal;
///
/// let portal = create_imperative_portal::<String>();
/// let handle = portal.show::<bool>("Delete file?".to_string());
/// assert_eq!(portal.contents().len(), 1);
///
/// handle.resolve(true);
/// assert!(handle.is_settled());
/// assert!(portal.contents().is_empty());
/// ```
pub struct Handle<C, T, E = Rejection>
where
    C: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    inner: Arc<HandleInner<C, T, E>>,
}

impl<C, T, E> Handle<C, T, E>
where
    C: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// A handle for `key` and the slot its entry must keep alive.
    pub(crate) fn new(key: EntryKey, registry: Weak<RegistryInner<C>>) -> (Self, PendingSlot) {
        let (deferred, slot) = Deferred::new();
        let handle = Self {
            inner: Arc::new(HandleInner {
                key,
                registry,
                deferred,
            }),
        };
        (handle, slot as PendingSlot)
    }

    /// The key of the entry this handle controls.
    pub fn key(&self) -> EntryKey {
        self.inner.key
    }

    /// Whether `resolve` or `reject` has already been called.
    pub fn is_settled(&self) -> bool {
        self.inner.deferred.is_settled()
    }

    /// Fulfil the entry with `value` and remove it from its registry.
    ///
    /// Does nothing if the entry is already settled or its registry has been
    /// dropped. Returns `true` for the call that settled it.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value), "resolved")
    }

    /// Reject the entry with `error` and remove it from its registry.
    ///
    /// Does nothing if the entry is already settled or its registry has been
    /// dropped. Returns `true` for the call that settled it.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error), "rejected")
    }

    /// Replace the entry's content in place.
    ///
    /// After settlement the new content is dropped: the entry is not brought
    /// back and no error is raised.
    pub fn update(&self, content: C) {
        if self.is_settled() {
            trace!(key = %self.key(), "update after settlement discarded");
            return;
        }

        match self.inner.registry.upgrade() {
            Some(registry) => {
                registry.replace(self.key(), content);
            }
            None => trace!(key = %self.key(), "update after registry drop discarded"),
        }
    }

    /// Replace the entry's content with content built from this handle.
    pub fn update_with<F>(&self, build: F)
    where
        F: FnOnce(&Self) -> C,
    {
        if self.is_settled() {
            trace!(key = %self.key(), "update after settlement discarded");
            return;
        }
        self.update(build(self));
    }

    /// A future for the entry's outcome.
    ///
    /// Any number of settlement futures can be taken; all of them observe the
    /// outcome fixed by the first `resolve` or `reject`.
    pub fn settlement(&self) -> Settlement<T, E> {
        Settlement {
            receiver: self.inner.deferred.receiver.clone(),
        }
    }

    /// The outcome, if the entry has settled.
    pub fn try_outcome(&self) -> Option<Result<T, HandleError<E>>> {
        self.settlement().now_or_never()
    }

    /// Run `f` with this handle published as the ambient handle.
    ///
    /// Presentation code normally gets this through `Entry::render`; this is
    /// for content produced outside an outlet.
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.registry_id() {
            Some(registry) => scope::with_scope(registry, self.erase(), f),
            None => f(),
        }
    }

    /// Check whether two handles control the same entry.
    pub fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn erase(&self) -> ErasedHandle {
        ErasedHandle {
            key: self.key(),
            type_name: type_name::<Self>(),
            inner: Arc::clone(&self.inner) as Arc<dyn Any + Send + Sync>,
        }
    }

    fn registry_id(&self) -> Option<super::key::RegistryId> {
        self.inner.registry.upgrade().map(|registry| registry.id())
    }

    fn settle(&self, outcome: Outcome<T, E>, verb: &'static str) -> bool {
        if !self.inner.deferred.settle(outcome) {
            trace!(key = %self.key(), "{verb} ignored: entry settled or abandoned");
            return false;
        }

        if let Some(registry) = self.inner.registry.upgrade() {
            debug!(registry = %registry.label(), key = %self.key(), "entry {verb}");
            registry.remove(self.key());
        }
        true
    }
}

impl<C, T> Handle<C, T, Rejection>
where
    C: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Reject with [`Rejection::Cancelled`].
    pub fn cancel(&self) -> bool {
        self.reject(Rejection::Cancelled)
    }

    /// Reject with [`Rejection::Dismissed`].
    pub fn dismiss(&self) -> bool {
        self.reject(Rejection::Dismissed)
    }
}

impl<C, T, E> Clone for Handle<C, T, E>
where
    C: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, T, E> fmt::Debug for Handle<C, T, E>
where
    C: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("key", &self.key())
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<C, T, E> IntoFuture for Handle<C, T, E>
where
    C: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, HandleError<E>>;
    type IntoFuture = Settlement<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.settlement()
    }
}

impl<C, T, E> IntoFuture for &Handle<C, T, E>
where
    C: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, HandleError<E>>;
    type IntoFuture = Settlement<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.settlement()
    }
}

/// Future resolving to a handle's outcome.
#[must_use = "futures do nothing unless awaited"]
pub struct Settlement<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    receiver: Shared<oneshot::Receiver<Outcome<T, E>>>,
}

impl<T, E> Future for Settlement<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, HandleError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver.poll_unpin(cx).map(|received| match received {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(HandleError::Rejected(error)),
            Err(_) => Err(HandleError::Abandoned),
        })
    }
}

impl<T, E> fmt::Debug for Settlement<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settlement").finish_non_exhaustive()
    }
}

/// A handle with its type parameters erased, as stored in entries and scopes.
#[derive(Clone)]
pub(crate) struct ErasedHandle {
    key: EntryKey,
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ErasedHandle {
    pub(crate) fn key(&self) -> EntryKey {
        self.key
    }

    /// Recover the typed handle.
    pub(crate) fn downcast<C, T, E>(&self) -> Result<Handle<C, T, E>, PortalError>
    where
        C: Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        Arc::clone(&self.inner)
            .downcast::<HandleInner<C, T, E>>()
            .map(|inner| Handle { inner })
            .map_err(|_| PortalError::HandleTypeMismatch {
                expected: type_name::<Handle<C, T, E>>(),
                found: self.type_name,
            })
    }
}

impl fmt::Debug for ErasedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedHandle")
            .field("key", &self.key)
            .field("type_name", &self.type_name)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
