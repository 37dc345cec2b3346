//! Ambient Handle Scope
//!
//! Content rendered for an entry often needs its own handle (a "Close"
//! button deep inside a dialog). The scope stack lets that code ask for the
//! enclosing handle instead of having it passed down explicitly.
//!
//! # Implementation
//!
//! We use a thread-local stack of frames. Rendering an entry pushes a frame
//! carrying the entry's handle; the guard pops it when rendering finishes.
//! Frames are tagged with the registry that owns them, so every portal has its
//! own channel and a lookup only ever sees frames from its own registry.
//!
//! Nested portals work naturally: the innermost frame for a registry wins.

use std::cell::RefCell;
use std::marker::PhantomData;

use smallvec::SmallVec;

use super::handle::ErasedHandle;
use super::key::{EntryKey, RegistryId};

thread_local! {
    static SCOPE_STACK: RefCell<SmallVec<[ScopeFrame; 4]>> = RefCell::new(SmallVec::new());
}

/// One entry's handle, published while its content renders.
#[derive(Clone)]
struct ScopeFrame {
    registry: RegistryId,
    key: EntryKey,
    handle: ErasedHandle,
}

/// Guard that pops the frame when dropped.
///
/// This keeps the stack balanced even if rendering panics. The guard is tied
/// to the thread that created it.
pub(crate) struct HandleScope {
    key: EntryKey,
    _not_send: PhantomData<*const ()>,
}

impl HandleScope {
    /// Publish `handle` as the enclosing handle for `registry`.
    pub(crate) fn enter(registry: RegistryId, handle: ErasedHandle) -> Self {
        let key = handle.key();
        SCOPE_STACK.with(|stack| {
            stack.borrow_mut().push(ScopeFrame {
                registry,
                key,
                handle,
            });
        });

        Self {
            key,
            _not_send: PhantomData,
        }
    }

    /// The innermost published handle belonging to `registry`.
    pub(crate) fn nearest(registry: RegistryId) -> Option<ErasedHandle> {
        SCOPE_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|frame| frame.registry == registry)
                .map(|frame| frame.handle.clone())
        })
    }

    /// Number of frames on this thread's stack.
    #[cfg(test)]
    pub(crate) fn depth() -> usize {
        SCOPE_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for HandleScope {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(frame) = popped {
                debug_assert_eq!(
                    frame.key, self.key,
                    "HandleScope mismatch: expected {}, got {}",
                    self.key, frame.key
                );
            }
        });
    }
}

/// Run `f` with `handle` published for `registry`.
pub(crate) fn with_scope<R>(
    registry: RegistryId,
    handle: ErasedHandle,
    f: impl FnOnce() -> R,
) -> R {
    let _scope = HandleScope::enter(registry, handle);
    f()
}
