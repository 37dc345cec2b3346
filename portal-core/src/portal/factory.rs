//! Portal Factory
//!
//! Every call to [`create_imperative_portal`] builds a fresh registry with its
//! own store and its own ambient scope channel. Nothing is shared between
//! portals, so an app can run one for modals and another for toasts.

use std::sync::Arc;

use super::handle::Handle;
use super::outlet::Outlet;
use super::registry::{Entry, Registry};
use crate::config::PortalConfig;
use crate::error::PortalError;

/// An independent portal: a registry plus its outlet.
pub struct ImperativePortal<C>
where
    C: Send + Sync + 'static,
{
    registry: Registry<C>,
}

/// Create a portal with the default config.
pub fn create_imperative_portal<C>() -> ImperativePortal<C>
where
    C: Send + Sync + 'static,
{
    ImperativePortal::new(PortalConfig::default())
}

impl<C> ImperativePortal<C>
where
    C: Send + Sync + 'static,
{
    /// Create a portal with the given config.
    pub fn new(config: PortalConfig) -> Self {
        Self {
            registry: Registry::new(config),
        }
    }

    /// Show `content`. See [`Registry::show`].
    pub fn show<T>(&self, content: C) -> Handle<C, T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.registry.show(content)
    }

    /// Show content built from its own handle. See [`Registry::show_with`].
    pub fn show_with<T, F>(&self, build: F) -> Handle<C, T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&Handle<C, T>) -> C,
    {
        self.registry.show_with(build)
    }

    /// Show `content` with rejection type `E`.
    pub fn show_fallible<T, E>(&self, content: C) -> Handle<C, T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        self.registry.show_fallible(content)
    }

    /// Show content built from its own handle, with rejection type `E`.
    pub fn show_fallible_with<T, E, F>(&self, build: F) -> Handle<C, T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce(&Handle<C, T, E>) -> C,
    {
        self.registry.show_fallible_with(build)
    }

    /// The live entries, in order.
    pub fn entries(&self) -> Arc<Vec<Entry<C>>> {
        self.registry.entries()
    }

    /// The live contents, in order.
    pub fn contents(&self) -> Vec<Arc<C>> {
        self.registry.contents()
    }

    /// The presentation surface.
    pub fn outlet(&self) -> Outlet<C> {
        self.registry.outlet()
    }

    /// The enclosing handle of the entry rendering right now.
    pub fn current_handle<T>(&self) -> Result<Handle<C, T>, PortalError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.registry.current_handle()
    }

    /// [`ImperativePortal::current_handle`] for handles with rejection type `E`.
    pub fn current_handle_fallible<T, E>(&self) -> Result<Handle<C, T, E>, PortalError>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        self.registry.current_handle_fallible()
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    /// Split into the presentation surface and the registry that shows
    /// content into it.
    pub fn into_parts(self) -> (Outlet<C>, Registry<C>) {
        (self.registry.outlet(), self.registry)
    }
}
