//! Static description of a benchmark run.

use crate::descriptor::{
    BenchmarkClassDescriptor, BenchmarkMethodDescriptor, ClassSource, Descriptor,
    EngineDescriptor, MethodSource, UniqueId,
};

/// A benchmark class and the methods to run inside it.
#[derive(Debug, Clone)]
pub struct ClassPlan {
    descriptor: BenchmarkClassDescriptor,
    methods: Vec<BenchmarkMethodDescriptor>,
}

impl ClassPlan {
    /// Creates a plan for an existing class descriptor.
    #[must_use]
    pub fn new(descriptor: BenchmarkClassDescriptor) -> Self {
        Self {
            descriptor,
            methods: Vec::new(),
        }
    }

    /// Creates a plan for `source` below `parent_id`.
    #[must_use]
    pub fn for_class(parent_id: &UniqueId, source: ClassSource) -> Self {
        Self::new(BenchmarkClassDescriptor::new(parent_id, source))
    }

    /// Adds a parameterless method declared by this class.
    #[must_use]
    pub fn with_method(self, method_name: impl Into<String>) -> Self {
        let source = MethodSource::new(self.descriptor.source().clone(), method_name);
        self.with_method_source(source)
    }

    /// Adds a method from its source.
    #[must_use]
    pub fn with_method_source(self, source: MethodSource) -> Self {
        let descriptor = BenchmarkMethodDescriptor::new(self.descriptor.unique_id(), source);
        self.with_method_descriptor(descriptor)
    }

    /// Adds a prepared method descriptor.
    #[must_use]
    pub fn with_method_descriptor(mut self, descriptor: BenchmarkMethodDescriptor) -> Self {
        self.methods.push(descriptor);
        self
    }

    /// Returns the class descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &BenchmarkClassDescriptor {
        &self.descriptor
    }

    /// Returns the method descriptors in execution order.
    #[must_use]
    pub fn methods(&self) -> &[BenchmarkMethodDescriptor] {
        &self.methods
    }
}

/// The engine root and its classes.
#[derive(Debug, Clone)]
pub struct BenchmarkPlan {
    engine: EngineDescriptor,
    classes: Vec<ClassPlan>,
}

impl BenchmarkPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new(engine: EngineDescriptor) -> Self {
        Self {
            engine,
            classes: Vec::new(),
        }
    }

    /// Adds a class.
    #[must_use]
    pub fn with_class(mut self, class: ClassPlan) -> Self {
        self.classes.push(class);
        self
    }

    /// Starts a class plan below the engine root.
    #[must_use]
    pub fn class(&self, class_name: impl Into<String>) -> ClassPlan {
        ClassPlan::for_class(self.engine.unique_id(), ClassSource::new(class_name))
    }

    /// Returns the engine descriptor.
    #[must_use]
    pub fn engine(&self) -> &EngineDescriptor {
        &self.engine
    }

    /// Returns the class plans in execution order.
    #[must_use]
    pub fn classes(&self) -> &[ClassPlan] {
        &self.classes
    }

    /// Returns the number of nodes in the plan, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .classes
            .iter()
            .map(|class| 1 + class.methods.len())
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plan_builds_nested_ids() {
        let plan = BenchmarkPlan::new(EngineDescriptor::new("benchscope", "Benchscope"));
        let class = plan.class("com.acme.ParserBench").with_method("parse");
        let plan = plan.with_class(class);

        let method = &plan.classes()[0].methods()[0];
        assert_eq!(
            method.unique_id().to_string(),
            "[engine:benchscope]/[class:com.acme.ParserBench]/[method:parse()]"
        );
        assert_eq!(method.source().class.class_name, "com.acme.ParserBench");
        assert_eq!(plan.node_count(), 3);
    }

    #[test]
    fn test_method_with_parameters() {
        let plan = BenchmarkPlan::new(EngineDescriptor::new("benchscope", "Benchscope"));
        let class = plan.class("Bench");
        let source = MethodSource::new(class.descriptor().source().clone(), "sum")
            .with_parameter_types(["int[]"]);
        let class = class.with_method_source(source);

        assert_eq!(class.methods()[0].display_name(), "sum(int[])");
    }
}
