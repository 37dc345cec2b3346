//! Portal Core
//!
//! This crate lets code outside a render tree (event handlers, async tasks)
//! put a unit of UI content into that tree, wait for it to finish, change it
//! while it is shown, and take it down again. The tree itself never has to
//! model whether the content exists.
//!
//! It implements:
//!
//! - An observable snapshot store
//! - A keyed registry of live entries with settlement handles
//! - Ambient lookup of the enclosing entry's handle
//! - Independent portal instances plus a process-wide default one
//!
//! Rendering, focus handling and animation belong to the presentation layer,
//! which only reads the entry list and calls handle methods.
//!
//! # Architecture
//!
//! The crate is organized into two layers:
//!
//! - `reactive`: the generic [`Store`](reactive::Store) and its binding seam
//! - `portal`: registry, handles, scope stack, outlet and factory
//!
//! # Example
//!
//! ```rust
//! use portal_core::create_imperative_portal;
//!
//! let portal = create_imperative_portal::<&'static str>();
//!
//! let first = portal.show::<()>("A");
//! let second = portal.show::<()>("B");
//! first.resolve(());
//! second.update("C");
//!
//! let contents: Vec<_> = portal.contents().iter().map(|c| **c).collect();
//! assert_eq!(contents, vec!["C"]);
//! ```

pub mod config;
pub mod error;
pub mod portal;
pub mod reactive;

use std::any::Any;
use std::sync::{Arc, OnceLock};

pub use config::PortalConfig;
pub use error::{HandleError, MissingContextError, PortalError, Rejection};
pub use portal::{
    create_imperative_portal, Entry, EntryKey, Handle, ImperativePortal, Outlet, Registry,
    Settlement,
};

/// Content type of the default portal.
pub type DynContent = Arc<dyn Any + Send + Sync>;

static DEFAULT_PORTAL: OnceLock<ImperativePortal<DynContent>> = OnceLock::new();

/// The process-wide default portal.
///
/// Created on first use with the label `default`. It is an ordinary portal
/// and behaves exactly like one from [`create_imperative_portal`].
pub fn default_portal() -> &'static ImperativePortal<DynContent> {
    DEFAULT_PORTAL.get_or_init(|| ImperativePortal::new(PortalConfig::labelled("default")))
}

/// Show `content` in the default portal.
///
/// A value that is already a [`DynContent`] is stored as is, not wrapped a
/// second time.
pub fn show<T>(content: impl Any + Send + Sync) -> Handle<DynContent, T>
where
    T: Clone + Send + Sync + 'static,
{
    default_portal().show(into_dyn_content(content))
}

/// Show content built from its own handle in the default portal.
pub fn show_with<T, F>(build: F) -> Handle<DynContent, T>
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce(&Handle<DynContent, T>) -> DynContent,
{
    default_portal().show_with(build)
}

fn into_dyn_content(content: impl Any + Send + Sync) -> DynContent {
    let boxed: Box<dyn Any + Send + Sync> = Box::new(content);
    match boxed.downcast::<DynContent>() {
        Ok(shared) => *shared,
        Err(other) => Arc::from(other),
    }
}

/// The enclosing handle of the default portal entry rendering right now.
pub fn current_handle<T>() -> Result<Handle<DynContent, T>, PortalError>
where
    T: Clone + Send + Sync + 'static,
{
    default_portal().current_handle()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_portal_is_a_single_instance() {
        let first = default_portal() as *const _;
        let second = default_portal() as *const _;
        assert_eq!(first, second);
    }

    #[test]
    fn show_in_default_portal_round_trips_through_lookup() {
        let handle = show::<u32>("toast");
        let found = default_portal()
            .registry()
            .within_entry(handle.key(), |content| {
                assert_eq!(content.downcast_ref::<&'static str>(), Some(&"toast"));
                current_handle::<u32>().unwrap()
            })
            .unwrap();

        assert!(found.same_handle(&handle));
        handle.resolve(1);
        assert!(!default_portal().registry().contains(handle.key()));
    }

    #[test]
    fn shared_content_is_not_wrapped_twice() {
        let content: DynContent = Arc::new("toast");
        let handle = show::<()>(Arc::clone(&content));

        let seen = default_portal()
            .registry()
            .within_entry(handle.key(), |shown| {
                assert!(Arc::ptr_eq(shown, &content));
                shown.downcast_ref::<&'static str>().copied()
            })
            .unwrap();

        assert_eq!(seen, Some("toast"));
        handle.resolve(());
    }

    #[test]
    fn show_with_builds_content_from_its_handle() {
        let handle = show_with::<(), _>(|handle| Arc::new(handle.key()) as DynContent);

        let key = default_portal()
            .registry()
            .within_entry(handle.key(), |shown| shown.downcast_ref::<EntryKey>().copied())
            .unwrap();

        assert_eq!(key, Some(handle.key()));
        handle.resolve(());
    }
}
