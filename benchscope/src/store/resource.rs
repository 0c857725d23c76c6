//! Release-capable store values.

/// A value that holds an external resource and must be released when the
/// scope that created it closes.
///
/// Every implementor is a [`StoreValue`](super::StoreValue), so values created
/// through [`ScopedStore::get_or_compute`] are tracked by the store and
/// released exactly once during [`ScopedStore::close_all_tracked`].
///
/// [`ScopedStore::get_or_compute`]: super::ScopedStore::get_or_compute
/// [`ScopedStore::close_all_tracked`]: super::ScopedStore::close_all_tracked
#[cfg_attr(test, mockall::automock)]
pub trait CloseableResource: Send + Sync {
    /// Releases the resource.
    fn close(&self) -> anyhow::Result<()>;
}
