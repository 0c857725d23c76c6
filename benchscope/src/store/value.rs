//! Values that can be computed into a store.

use super::CloseableResource;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

/// A value that [`ScopedStore::get_or_compute`] can create.
///
/// Every [`CloseableResource`] is a `StoreValue` that reports itself as
/// closeable, so a resource computed into a store is released when the store
/// closes. Plain data opts in with an empty impl:
///
/// ```rust,ignore
/// struct Warmup { rounds: u32 }
///
/// impl StoreValue for Warmup {}
/// ```
///
/// [`ScopedStore::get_or_compute`]: super::ScopedStore::get_or_compute
pub trait StoreValue: Any + Send + Sync {
    /// Returns the release handle for this value, if it has one.
    fn into_closeable(self: Arc<Self>) -> Option<Arc<dyn CloseableResource>> {
        None
    }
}

impl<T> StoreValue for T
where
    T: CloseableResource + Any,
{
    fn into_closeable(self: Arc<Self>) -> Option<Arc<dyn CloseableResource>> {
        Some(self)
    }
}

macro_rules! plain_store_values {
    ($($ty:ty),* $(,)?) => {
        $(impl StoreValue for $ty {})*
    };
}

plain_store_values!(
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
    std::path::PathBuf,
    std::time::Duration,
    serde_json::Value,
    uuid::Uuid,
    chrono::DateTime<chrono::Utc>,
);

impl<T: Send + Sync + 'static> StoreValue for Vec<T> {}

impl<T: Send + Sync + 'static> StoreValue for VecDeque<T> {}

impl<T: Send + Sync + 'static> StoreValue for Option<T> {}

impl<T: ?Sized + Send + Sync + 'static> StoreValue for Arc<T> {}

impl<T: Send + Sync + 'static> StoreValue for parking_lot::Mutex<T> {}

impl<T: Send + Sync + 'static> StoreValue for BTreeSet<T> {}

impl<T: Eq + Hash + Send + Sync + 'static> StoreValue for HashSet<T> {}

impl<K, V> StoreValue for BTreeMap<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
}

impl<K, V> StoreValue for HashMap<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
}
