//! Portal Registry
//!
//! This module implements the imperative entry lifecycle on top of the
//! reactive store: showing content, updating it through its handle, and
//! removing it when the handle settles.
//!
//! # Concepts
//!
//! ## Entries
//!
//! An [`Entry`] is one live unit of content with a unique [`EntryKey`]. It is
//! created by `show` and removed by the first settlement of its handle.
//!
//! ## Handles
//!
//! A [`Handle`] controls one entry. It can be awaited (it is `IntoFuture`),
//! resolved, rejected, and asked to replace the entry's content.
//!
//! ## Ambient lookup
//!
//! While an entry renders, its handle is published on a thread-local scope
//! stack. Code inside the content calls
//! [`Registry::current_handle`] instead of receiving the handle as a
//! parameter.
//!
//! ## Outlets
//!
//! An [`Outlet`] is the read surface a presentation layer mounts.

mod factory;
mod handle;
mod key;
mod outlet;
mod registry;
mod scope;

pub use factory::{create_imperative_portal, ImperativePortal};
pub use handle::{Handle, Settlement};
pub use key::{EntryKey, RegistryId};
pub use outlet::Outlet;
pub use registry::{Entry, Registry};
