//! Level-specific context aliases and accessors.

use super::NodeContext;
use crate::descriptor::{
    BenchmarkClassDescriptor, BenchmarkMethodDescriptor, ClassSource, Descriptor,
    EngineDescriptor, MethodSource,
};

/// Context of the engine root.
pub type EngineContext = NodeContext<EngineDescriptor>;

/// Context of a benchmark class.
pub type BenchmarkClassContext = NodeContext<BenchmarkClassDescriptor>;

/// Context of a benchmark method.
pub type BenchmarkMethodContext = NodeContext<BenchmarkMethodDescriptor>;

impl NodeContext<EngineDescriptor> {
    /// Returns the engine id taken from the root segment.
    pub fn engine_id(&self) -> Option<&str> {
        self.descriptor().unique_id().engine_id()
    }
}

impl NodeContext<BenchmarkClassDescriptor> {
    /// Returns the benchmark class.
    pub fn benchmark_class(&self) -> &ClassSource {
        self.descriptor().source()
    }
}

impl NodeContext<BenchmarkMethodDescriptor> {
    /// Returns the class declaring the method.
    pub fn benchmark_class(&self) -> &ClassSource {
        &self.descriptor().source().class
    }

    /// Returns the benchmark method.
    pub fn benchmark_method(&self) -> &MethodSource {
        self.descriptor().source()
    }
}
