//! Builder for execution contexts.

use super::{ExecutionContext, NodeContext};
use crate::config::ConfigurationParameters;
use crate::descriptor::Descriptor;
use crate::errors::{BenchscopeError, PreconditionViolation};
use crate::listener::{ExecutionListener, NoOpListener};
use std::sync::Arc;

/// Collects the collaborators of a [`NodeContext`] and checks them at build
/// time.
///
/// The descriptor and configuration are required. The listener falls back to
/// [`NoOpListener`] and the parent to none.
pub struct ContextBuilder<D: Descriptor> {
    parent: Option<Arc<dyn ExecutionContext>>,
    listener: Option<Arc<dyn ExecutionListener>>,
    descriptor: Option<Arc<D>>,
    configuration: Option<Arc<dyn ConfigurationParameters>>,
}

impl<D: Descriptor> Default for ContextBuilder<D> {
    fn default() -> Self {
        Self {
            parent: None,
            listener: None,
            descriptor: None,
            configuration: None,
        }
    }
}

impl<D: Descriptor> ContextBuilder<D> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parent context.
    #[must_use]
    pub fn parent(mut self, parent: Arc<dyn ExecutionContext>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the listener.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn ExecutionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the descriptor.
    #[must_use]
    pub fn descriptor(mut self, descriptor: impl Into<Arc<D>>) -> Self {
        self.descriptor = Some(descriptor.into());
        self
    }

    /// Sets the configuration parameters.
    #[must_use]
    pub fn configuration(mut self, configuration: Arc<dyn ConfigurationParameters>) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Builds the context.
    ///
    /// # Errors
    ///
    /// Returns `BenchscopeError::Precondition` if the descriptor or the
    /// configuration is missing.
    pub fn build(self) -> Result<NodeContext<D>, BenchscopeError> {
        let descriptor = self
            .descriptor
            .ok_or_else(|| PreconditionViolation::new("descriptor must not be absent"))?;
        let configuration = self.configuration.ok_or_else(|| {
            PreconditionViolation::new("configuration parameters must not be absent")
        })?;
        let listener = self
            .listener
            .unwrap_or_else(|| Arc::new(NoOpListener) as Arc<dyn ExecutionListener>);

        Ok(NodeContext::new(self.parent, listener, descriptor, configuration))
    }
}

impl<D: Descriptor> std::fmt::Debug for ContextBuilder<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("has_parent", &self.parent.is_some())
            .field("has_listener", &self.listener.is_some())
            .field("has_descriptor", &self.descriptor.is_some())
            .field("has_configuration", &self.configuration.is_some())
            .finish()
    }
}
