//! Callbacks invoked by the executor.

use crate::context::{BenchmarkClassContext, BenchmarkMethodContext, EngineContext};

/// The work performed at each level of the tree.
///
/// Implementations use the context's store for fixtures and its report
/// methods for results. Returning an error fails the node; panics are caught
/// and treated the same way.
pub trait BenchmarkAction: Send + Sync {
    /// Runs once after the engine context opens.
    fn before_all(&self, _engine: &EngineContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs once per class after its context opens. A failure aborts every
    /// method of the class.
    fn before_class(&self, _class: &BenchmarkClassContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs one benchmark method.
    fn run_method(&self, method: &BenchmarkMethodContext) -> anyhow::Result<()>;
}
