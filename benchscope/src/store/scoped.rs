//! Scoped store with parent-delegated lookup and tracked release.

use super::{CloseableResource, Namespace, StoreValue};
use crate::errors::{CloseError, ReleaseFailure, StoreError};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// A type-erased value held by a store.
pub type StoredValue = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CompositeKey {
    namespace: Namespace,
    key: String,
}

impl CompositeKey {
    fn new(namespace: &Namespace, key: &str) -> Self {
        Self {
            namespace: namespace.clone(),
            key: key.to_string(),
        }
    }
}

/// A slot in the store. The value is empty while it is being computed.
struct Entry {
    id: u64,
    value: OnceLock<StoredValue>,
}

/// A locally created value scheduled for release.
struct Tracked {
    key: CompositeKey,
    resource: Arc<dyn CloseableResource>,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<CompositeKey, Arc<Entry>>,
    tracked: Vec<Tracked>,
}

/// A namespaced key/value store owned by one execution scope.
///
/// Lookups that miss locally are delegated to the parent store, if any,
/// without copying the inherited value into this store. Closeable values
/// created through [`get_or_compute`](Self::get_or_compute) are tracked in
/// creation order and released together by
/// [`close_all_tracked`](Self::close_all_tracked).
///
/// Mutations are expected to come from the single executor that owns the
/// scope; the internal lock only keeps concurrent readers (child scopes
/// delegating upward) consistent.
pub struct ScopedStore {
    parent: Option<Arc<ScopedStore>>,
    owner: String,
    next_entry_id: AtomicU64,
    state: Mutex<StoreState>,
}

impl ScopedStore {
    /// Creates a new store, optionally delegating to `parent`.
    #[must_use]
    pub fn new(parent: Option<Arc<ScopedStore>>) -> Self {
        Self {
            parent,
            owner: "<detached>".to_string(),
            next_entry_id: AtomicU64::new(0),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Sets the owner label used to attribute release failures.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Returns the owner label.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the parent store, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<ScopedStore>> {
        self.parent.as_ref()
    }

    /// Gets a value from this store or the nearest ancestor holding it.
    #[must_use]
    pub fn get_value(&self, namespace: &Namespace, key: &str) -> Option<StoredValue> {
        self.lookup(&CompositeKey::new(namespace, key))
    }

    /// Gets a typed value from this store or the nearest ancestor holding it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TypeMismatch` if the value found is not a `T`.
    pub fn get<T>(&self, namespace: &Namespace, key: &str) -> Result<Option<Arc<T>>, StoreError>
    where
        T: Any + Send + Sync,
    {
        self.get_value(namespace, key)
            .map(|value| downcast(value, namespace, key))
            .transpose()
    }

    /// Returns true if the key is visible from this store.
    #[must_use]
    pub fn contains(&self, namespace: &Namespace, key: &str) -> bool {
        self.get_value(namespace, key).is_some()
    }

    /// Inserts or overwrites a value in this store.
    ///
    /// Overwriting a tracked value drops its tracking; the previous value is
    /// not released.
    pub fn put<T>(&self, namespace: &Namespace, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        let composite = CompositeKey {
            namespace: namespace.clone(),
            key: key.into(),
        };
        let entry = self.new_entry();
        // A fresh cell is always empty, so this cannot fail.
        let _ = entry.value.set(Arc::new(value));

        let mut state = self.state.lock();
        state.tracked.retain(|t| t.key != composite);
        state.entries.insert(composite, entry);
    }

    /// Returns the value for the key, computing and storing it locally if no
    /// store in the chain holds it.
    ///
    /// `compute` runs at most once per key in this store. A newly computed
    /// value whose [`StoreValue`] impl exposes a release handle is tracked
    /// and released by [`close_all_tracked`](Self::close_all_tracked).
    /// Values that already existed, locally or in an ancestor, are not
    /// tracked. If `compute` panics nothing is stored and a later call
    /// computes again.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TypeMismatch` if an existing value is not a `T`.
    pub fn get_or_compute<T, F>(
        &self,
        namespace: &Namespace,
        key: &str,
        compute: F,
    ) -> Result<Arc<T>, StoreError>
    where
        T: StoreValue,
        F: FnOnce(&str) -> T,
    {
        let value = self.compute_if_absent(namespace, key, |k| {
            let value = Arc::new(compute(k));
            let closeable = T::into_closeable(Arc::clone(&value));
            let stored: StoredValue = value;
            (stored, closeable)
        });
        downcast(value, namespace, key)
    }

    /// Removes a value from this store only.
    ///
    /// A removed value is no longer tracked; the caller owns its release.
    /// Ancestor stores are never touched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TypeMismatch` if the local value is not a `T`;
    /// the value stays in place in that case.
    pub fn remove<T>(&self, namespace: &Namespace, key: &str) -> Result<Option<Arc<T>>, StoreError>
    where
        T: Any + Send + Sync,
    {
        let composite = CompositeKey::new(namespace, key);
        let mut state = self.state.lock();

        let Some(value) = state
            .entries
            .get(&composite)
            .and_then(|e| e.value.get().cloned())
        else {
            return Ok(None);
        };

        let typed = downcast(value, namespace, key)?;
        state.entries.remove(&composite);
        state.tracked.retain(|t| t.key != composite);
        Ok(Some(typed))
    }

    /// Releases every tracked value in registration order.
    ///
    /// Every tracked value is attempted exactly once, even when earlier
    /// releases fail or panic. Tracking is cleared, so a second call is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns a `CloseError` listing each value that failed to release.
    pub fn close_all_tracked(&self) -> Result<(), CloseError> {
        let tracked = std::mem::take(&mut self.state.lock().tracked);
        if tracked.is_empty() {
            return Ok(());
        }

        debug!(owner = %self.owner, count = tracked.len(), "Releasing tracked store values");

        let mut failures = Vec::new();
        for Tracked { key, resource } in tracked {
            let error = match panic::catch_unwind(AssertUnwindSafe(|| resource.close())) {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(payload) => {
                    anyhow::anyhow!("release panicked: {}", panic_message(payload.as_ref()))
                }
            };

            warn!(
                owner = %self.owner,
                namespace = %key.namespace,
                key = %key.key,
                error = %error,
                "Failed to release store value"
            );
            failures.push(ReleaseFailure::new(key.namespace, key.key, error));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CloseError::new(self.owner.clone(), failures))
        }
    }

    /// Returns the number of values awaiting release.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.state.lock().tracked.len()
    }

    /// Returns the number of values held locally.
    #[must_use]
    pub fn local_len(&self) -> usize {
        self.state.lock().entries.len()
    }

    fn new_entry(&self) -> Arc<Entry> {
        Arc::new(Entry {
            id: self.next_entry_id.fetch_add(1, Ordering::Relaxed),
            value: OnceLock::new(),
        })
    }

    fn local(&self, key: &CompositeKey) -> Option<StoredValue> {
        self.state
            .lock()
            .entries
            .get(key)
            .and_then(|e| e.value.get().cloned())
    }

    fn lookup(&self, key: &CompositeKey) -> Option<StoredValue> {
        let mut current = Some(self);
        while let Some(store) = current {
            if let Some(value) = store.local(key) {
                return Some(value);
            }
            current = store.parent.as_deref();
        }
        None
    }

    fn compute_if_absent<F>(&self, namespace: &Namespace, key: &str, create: F) -> StoredValue
    where
        F: FnOnce(&str) -> (StoredValue, Option<Arc<dyn CloseableResource>>),
    {
        let composite = CompositeKey::new(namespace, key);

        // Lock order is always child before parent.
        let entry = {
            let mut state = self.state.lock();
            if let Some(entry) = state.entries.get(&composite) {
                Arc::clone(entry)
            } else {
                if let Some(inherited) = self.parent.as_deref().and_then(|p| p.lookup(&composite)) {
                    return inherited;
                }
                let entry = self.new_entry();
                state.entries.insert(composite.clone(), Arc::clone(&entry));
                entry
            }
        };

        let pending = PendingEntry {
            state: &self.state,
            key: &composite,
            id: entry.id,
        };
        let mut created = None;
        let value = Arc::clone(entry.value.get_or_init(|| {
            debug!(owner = %self.owner, namespace = %namespace, key, "Computing store value");
            let (value, closeable) = create(key);
            created = closeable;
            value
        }));
        drop(pending);

        if let Some(resource) = created {
            let mut state = self.state.lock();
            let still_current = state
                .entries
                .get(&composite)
                .is_some_and(|e| e.id == entry.id);
            if still_current {
                state.tracked.push(Tracked {
                    key: composite,
                    resource,
                });
            } else {
                warn!(
                    owner = %self.owner,
                    namespace = %namespace,
                    key,
                    "Computed resource was replaced during compute and will not be released"
                );
            }
        }

        value
    }
}

/// Removes an entry left empty by a `compute` that unwound.
struct PendingEntry<'a> {
    state: &'a Mutex<StoreState>,
    key: &'a CompositeKey,
    id: u64,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }
        let mut state = self.state.lock();
        let abandoned = state
            .entries
            .get(self.key)
            .is_some_and(|e| e.id == self.id && e.value.get().is_none());
        if abandoned {
            state.entries.remove(self.key);
        }
    }
}

impl std::fmt::Debug for ScopedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStore")
            .field("owner", &self.owner)
            .field("has_parent", &self.parent.is_some())
            .field("local_len", &self.local_len())
            .field("tracked_count", &self.tracked_count())
            .finish()
    }
}

fn downcast<T>(value: StoredValue, namespace: &Namespace, key: &str) -> Result<Arc<T>, StoreError>
where
    T: Any + Send + Sync,
{
    value
        .downcast::<T>()
        .map_err(|_| StoreError::type_mismatch::<T>(namespace, key))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
