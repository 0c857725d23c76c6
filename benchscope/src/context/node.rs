//! The execution context trait and its generic implementation.

use super::ContextBuilder;
use crate::config::ConfigurationParameters;
use crate::descriptor::{Descriptor, Element, TagSet, UniqueId};
use crate::errors::{BenchscopeError, CloseError};
use crate::listener::{ExecutionListener, ReportEntry};
use crate::store::{Namespace, NamespacedStore, ScopedStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// One scope in the context tree.
///
/// Every scope owns a [`ScopedStore`] whose lookups fall back to the parent
/// scope's store, reports its own descriptor's tags only, and forwards report
/// entries to the shared listener.
pub trait ExecutionContext: Send + Sync {
    /// Returns the unique id of the node.
    fn unique_id(&self) -> &UniqueId;

    /// Returns the display name of the node.
    fn display_name(&self) -> &str;

    /// Returns the language-level element the node represents, if any.
    fn element(&self) -> Option<Element>;

    /// Returns the parent scope, or `None` for the root.
    fn parent(&self) -> Option<Arc<dyn ExecutionContext>>;

    /// Returns the terminal ancestor of this scope (itself for the root).
    fn root(self: Arc<Self>) -> Arc<dyn ExecutionContext>;

    /// Returns a fresh copy of the tags declared on this node.
    ///
    /// Ancestor tags are not included.
    fn tags(&self) -> TagSet;

    /// Looks up a tree-wide configuration parameter.
    fn configuration_parameter(&self, key: &str) -> Option<String>;

    /// Forwards a report entry to the listener, tagged with this node.
    ///
    /// # Errors
    ///
    /// Returns `BenchscopeError::InvalidReportEntry` for blank keys or values
    /// and propagates listener failures unchanged.
    fn publish_report_entry(&self, values: BTreeMap<String, String>) -> Result<(), BenchscopeError>;

    /// Publishes a single key/value pair.
    ///
    /// # Errors
    ///
    /// See [`publish_report_entry`](Self::publish_report_entry).
    fn publish_report_value(&self, key: &str, value: &str) -> Result<(), BenchscopeError> {
        self.publish_report_entry(BTreeMap::from([(key.to_string(), value.to_string())]))
    }

    /// Publishes a single value under the key `value`.
    ///
    /// # Errors
    ///
    /// See [`publish_report_entry`](Self::publish_report_entry).
    fn publish_report_message(&self, value: &str) -> Result<(), BenchscopeError> {
        self.publish_report_value("value", value)
    }

    /// Returns the store owned by this scope.
    fn values_store(&self) -> &Arc<ScopedStore>;

    /// Returns a view over this scope's store bound to `namespace`.
    fn store(&self, namespace: Namespace) -> NamespacedStore<'_> {
        NamespacedStore::new(self.values_store(), namespace)
    }

    /// Releases every resource this scope created.
    ///
    /// Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a `CloseError` attributed to this node's unique id if any
    /// resource failed to release.
    fn close(&self) -> Result<(), CloseError>;
}

/// Returns true if both handles point at the same scope.
#[must_use]
pub fn same_context(a: &Arc<dyn ExecutionContext>, b: &Arc<dyn ExecutionContext>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// An execution context for a node described by `D`.
///
/// Level-specific accessors live on the concrete aliases, e.g.
/// [`BenchmarkClassContext`](super::BenchmarkClassContext).
pub struct NodeContext<D: Descriptor> {
    parent: Option<Arc<dyn ExecutionContext>>,
    listener: Arc<dyn ExecutionListener>,
    descriptor: Arc<D>,
    tags: TagSet,
    configuration: Arc<dyn ConfigurationParameters>,
    store: Arc<ScopedStore>,
}

impl<D: Descriptor> NodeContext<D> {
    /// Creates a context below `parent`.
    ///
    /// The new store delegates to the parent's store; the tag set is
    /// materialized from the descriptor once.
    #[must_use]
    pub fn new(
        parent: Option<Arc<dyn ExecutionContext>>,
        listener: Arc<dyn ExecutionListener>,
        descriptor: Arc<D>,
        configuration: Arc<dyn ConfigurationParameters>,
    ) -> Self {
        let parent_store = parent.as_ref().map(|p| Arc::clone(p.values_store()));
        let store = Arc::new(
            ScopedStore::new(parent_store).with_owner(descriptor.unique_id().to_string()),
        );
        let tags = TagSet::from_tags(descriptor.tags());

        debug!(
            unique_id = %descriptor.unique_id(),
            has_parent = parent.is_some(),
            "Opened execution context"
        );

        Self {
            parent,
            listener,
            descriptor,
            tags,
            configuration,
            store,
        }
    }

    /// Returns a builder that checks its collaborators at build time.
    #[must_use]
    pub fn builder() -> ContextBuilder<D> {
        ContextBuilder::new()
    }

    /// Creates a child context sharing this context's listener and
    /// configuration.
    #[must_use]
    pub fn child<C: Descriptor>(self: &Arc<Self>, descriptor: Arc<C>) -> NodeContext<C> {
        let parent: Arc<dyn ExecutionContext> = Arc::clone(self) as Arc<dyn ExecutionContext>;
        NodeContext::new(
            Some(parent),
            Arc::clone(&self.listener),
            descriptor,
            Arc::clone(&self.configuration),
        )
    }

    /// Returns the descriptor of this node.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<D> {
        &self.descriptor
    }

    /// Returns the shared listener.
    #[must_use]
    pub fn listener(&self) -> &Arc<dyn ExecutionListener> {
        &self.listener
    }

    /// Returns the shared configuration parameters.
    #[must_use]
    pub fn configuration(&self) -> &Arc<dyn ConfigurationParameters> {
        &self.configuration
    }
}

impl<D: Descriptor> ExecutionContext for NodeContext<D> {
    fn unique_id(&self) -> &UniqueId {
        self.descriptor.unique_id()
    }

    fn display_name(&self) -> &str {
        self.descriptor.display_name()
    }

    fn element(&self) -> Option<Element> {
        self.descriptor.element()
    }

    fn parent(&self) -> Option<Arc<dyn ExecutionContext>> {
        self.parent.clone()
    }

    fn root(self: Arc<Self>) -> Arc<dyn ExecutionContext> {
        let mut current: Arc<dyn ExecutionContext> = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    fn tags(&self) -> TagSet {
        self.tags.clone()
    }

    fn configuration_parameter(&self, key: &str) -> Option<String> {
        self.configuration.get(key)
    }

    fn publish_report_entry(&self, values: BTreeMap<String, String>) -> Result<(), BenchscopeError> {
        let entry = ReportEntry::from_map(values)?;
        self.listener
            .reporting_entry_published(&*self.descriptor, &entry)?;
        Ok(())
    }

    fn values_store(&self) -> &Arc<ScopedStore> {
        &self.store
    }

    fn close(&self) -> Result<(), CloseError> {
        let result = self.store.close_all_tracked();
        match &result {
            Ok(()) => debug!(unique_id = %self.unique_id(), "Closed execution context"),
            Err(err) => warn!(
                unique_id = %self.unique_id(),
                failures = err.failures.len(),
                "Closed execution context with release failures"
            ),
        }
        result
    }
}

impl<D: Descriptor> std::fmt::Debug for NodeContext<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("unique_id", &self.unique_id().to_string())
            .field("display_name", &self.display_name())
            .field("tags", &self.tags)
            .field("has_parent", &self.parent.is_some())
            .field("store", &self.store)
            .finish()
    }
}
