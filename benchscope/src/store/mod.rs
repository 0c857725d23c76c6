//! Scoped value stores for execution contexts.
//!
//! This module provides:
//! - Namespaces that partition a store's key space
//! - A scoped store with parent-delegated lookup and tracked release
//! - The `StoreValue` bound that decides which computed values get released
//! - A namespace-bound view handed out by contexts

mod namespace;
mod resource;
mod scoped;
mod value;
mod view;

pub use namespace::Namespace;
pub use resource::CloseableResource;
pub(crate) use scoped::panic_message;
pub use scoped::{ScopedStore, StoredValue};
pub use value::StoreValue;
pub use view::NamespacedStore;

#[cfg(test)]
pub use resource::MockCloseableResource;
