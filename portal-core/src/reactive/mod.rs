//! Reactive Store
//!
//! This module implements the observable state container the portal registry
//! is built on. It knows nothing about entries or handles.
//!
//! # Concepts
//!
//! ## Store
//!
//! A [`Store`] holds one immutable snapshot. `set` takes an updater that maps
//! the current snapshot to the next one; if the updater returns a different
//! `Arc`, the snapshot is replaced and listeners are notified synchronously.
//!
//! ## Subscriptions
//!
//! Listeners are plain callbacks. `subscribe` returns a [`Subscription`]
//! guard, and dropping it removes the listener.
//!
//! ## Bindings
//!
//! [`ExternalStore`] is what a rendering layer binds to: current snapshot,
//! stable initial snapshot, subscribe. [`Binding`] tracks the last snapshot a
//! renderer has seen.

mod binding;
mod store;
mod subscriber;

pub use binding::{Binding, ExternalStore};
pub use store::Store;
pub use subscriber::{SubscriberId, Subscription};
