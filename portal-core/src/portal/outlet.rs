//! Outlet
//!
//! The outlet is what a presentation layer mounts. It reads the registry's
//! entry list, re-renders when that list is replaced, and renders each entry
//! with its handle in ambient scope.

use std::fmt;
use std::sync::Arc;

use super::registry::{Entry, Registry};
use crate::reactive::{ExternalStore, Store, Subscription};

/// Read-only presentation surface of one registry.
pub struct Outlet<C>
where
    C: Send + Sync + 'static,
{
    registry: Registry<C>,
    store: Store<Vec<Entry<C>>>,
}

impl<C> Outlet<C>
where
    C: Send + Sync + 'static,
{
    pub(crate) fn new(registry: Registry<C>, store: Store<Vec<Entry<C>>>) -> Self {
        Self { registry, store }
    }

    /// The registry this outlet presents.
    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    /// The live contents, in order.
    pub fn contents(&self) -> Vec<Arc<C>> {
        self.registry.contents()
    }

    /// Render every live entry in order.
    ///
    /// `render` runs once per entry with that entry's handle in ambient
    /// scope.
    pub fn render<R>(&self, mut render: impl FnMut(&Entry<C>) -> R) -> Vec<R> {
        self.store
            .get()
            .iter()
            .map(|entry| entry.render(|_| render(entry)))
            .collect()
    }

    /// Render every live entry, then combine the results with `wrap`.
    ///
    /// `wrap` runs once over the whole sequence, even when it is empty.
    pub fn render_wrapped<R, W>(
        &self,
        render: impl FnMut(&Entry<C>) -> R,
        wrap: impl FnOnce(Vec<R>) -> W,
    ) -> W {
        wrap(self.render(render))
    }
}

impl<C> Clone for Outlet<C>
where
    C: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            store: self.store.clone(),
        }
    }
}

impl<C> ExternalStore for Outlet<C>
where
    C: Send + Sync + 'static,
{
    type Snapshot = Vec<Entry<C>>;

    fn snapshot(&self) -> Arc<Vec<Entry<C>>> {
        self.store.get()
    }

    fn initial_snapshot(&self) -> Arc<Vec<Entry<C>>> {
        self.store.initial()
    }

    fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }
}

impl<C> fmt::Debug for Outlet<C>
where
    C: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outlet")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Binding;
    use crate::PortalConfig;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn render_runs_in_call_order_with_scope() {
        let registry: Registry<String> = Registry::new(PortalConfig::default());
        let a = registry.show::<()>("A".to_string());
        let b = registry.show::<()>("B".to_string());
        let outlet = registry.outlet();

        let rendered = outlet.render(|entry| {
            let handle = registry.current_handle::<()>().unwrap();
            (entry.content().clone(), handle.key())
        });

        assert_eq!(
            rendered,
            vec![("A".to_string(), a.key()), ("B".to_string(), b.key())]
        );
    }

    #[test]
    fn render_wrapped_applies_wrap_once() {
        let registry: Registry<String> = Registry::new(PortalConfig::default());
        registry.show::<()>("A".to_string());
        registry.show::<()>("B".to_string());

        let wraps = AtomicI32::new(0);
        let html = registry.outlet().render_wrapped(
            |entry| format!("<li>{}</li>", entry.content()),
            |items| {
                wraps.fetch_add(1, Ordering::SeqCst);
                format!("<ul>{}</ul>", items.concat())
            },
        );

        assert_eq!(html, "<ul><li>A</li><li>B</li></ul>");
        assert_eq!(wraps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn binding_sees_membership_changes() {
        let registry: Registry<&'static str> = Registry::new(PortalConfig::default());
        let outlet = registry.outlet();
        let initial = outlet.initial_snapshot();
        let mut binding = Binding::new(outlet.clone());

        let handle = registry.show::<()>("A");
        let (snapshot, changed) = binding.read();
        assert!(changed);
        assert_eq!(snapshot.len(), 1);

        handle.update("A2");
        let (snapshot, changed) = binding.read();
        assert!(changed);
        assert_eq!(*snapshot[0].content(), "A2");

        let (_, changed) = binding.read();
        assert!(!changed);

        assert!(Arc::ptr_eq(&initial, &outlet.initial_snapshot()));
        assert!(initial.is_empty());
    }

    #[test]
    fn subscribers_hear_show_update_and_settle() {
        let registry: Registry<&'static str> = Registry::new(PortalConfig::default());
        let outlet = registry.outlet();
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();
        let _sub = outlet.subscribe(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let handle = registry.show::<()>("A");
        handle.update("B");
        handle.resolve(());
        handle.update("C");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
