//! Namespace-bound view over a scoped store.

use super::{Namespace, ScopedStore, StoreValue};
use crate::errors::StoreError;
use std::any::Any;
use std::sync::Arc;

/// A view over a [`ScopedStore`] fixed to one namespace.
///
/// Contexts hand these out so callers never pass the namespace per call.
#[derive(Debug, Clone)]
pub struct NamespacedStore<'a> {
    store: &'a ScopedStore,
    namespace: Namespace,
}

impl<'a> NamespacedStore<'a> {
    /// Creates a view over `store` bound to `namespace`.
    #[must_use]
    pub fn new(store: &'a ScopedStore, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    /// Returns the bound namespace.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Gets a typed value, delegating to ancestor stores on a local miss.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TypeMismatch` if the value found is not a `T`.
    pub fn get<T>(&self, key: &str) -> Result<Option<Arc<T>>, StoreError>
    where
        T: Any + Send + Sync,
    {
        self.store.get(&self.namespace, key)
    }

    /// Gets a typed value, falling back to `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TypeMismatch` if the value found is not a `T`.
    pub fn get_or_default<T>(&self, key: &str, default: T) -> Result<Arc<T>, StoreError>
    where
        T: Any + Send + Sync,
    {
        Ok(self.get(key)?.unwrap_or_else(|| Arc::new(default)))
    }

    /// Returns true if the key is visible from this scope.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(&self.namespace, key)
    }

    /// Inserts or overwrites a value in the local scope.
    pub fn put<T>(&self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.store.put(&self.namespace, key, value);
    }

    /// See [`ScopedStore::get_or_compute`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TypeMismatch` if an existing value is not a `T`.
    pub fn get_or_compute<T, F>(&self, key: &str, compute: F) -> Result<Arc<T>, StoreError>
    where
        T: StoreValue,
        F: FnOnce(&str) -> T,
    {
        self.store.get_or_compute(&self.namespace, key, compute)
    }

    /// See [`ScopedStore::remove`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TypeMismatch` if the local value is not a `T`.
    pub fn remove<T>(&self, key: &str) -> Result<Option<Arc<T>>, StoreError>
    where
        T: Any + Send + Sync,
    {
        self.store.remove(&self.namespace, key)
    }
}
