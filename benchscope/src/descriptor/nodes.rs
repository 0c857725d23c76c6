//! Engine, class and method descriptors.

use super::{BenchmarkTag, UniqueId};
use serde::{Deserialize, Serialize};

/// Identity and metadata of one node in the benchmark tree.
pub trait Descriptor: Send + Sync + 'static {
    /// Returns the unique id of the node.
    fn unique_id(&self) -> &UniqueId;

    /// Returns the human-readable name of the node.
    fn display_name(&self) -> &str;

    /// Returns the tags declared directly on the node.
    fn tags(&self) -> &[BenchmarkTag];

    /// Returns the language-level element the node represents, if any.
    fn element(&self) -> Option<Element> {
        None
    }
}

/// The benchmark class a node was discovered from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassSource {
    /// Fully qualified class name, e.g. `com.acme.ParserBench`.
    pub class_name: String,
}

impl ClassSource {
    /// Creates a class source.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }

    /// Returns the class name without its package, including nesting.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.class_name
            .rsplit_once('.')
            .map_or(self.class_name.as_str(), |(_, simple)| simple)
    }
}

/// The benchmark method a node was discovered from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSource {
    /// The declaring class.
    pub class: ClassSource,
    /// The method name.
    pub method_name: String,
    /// Parameter type names, in declaration order.
    #[serde(default)]
    pub parameter_types: Vec<String>,
}

impl MethodSource {
    /// Creates a method source without parameters.
    #[must_use]
    pub fn new(class: ClassSource, method_name: impl Into<String>) -> Self {
        Self {
            class,
            method_name: method_name.into(),
            parameter_types: Vec::new(),
        }
    }

    /// Sets the parameter types.
    #[must_use]
    pub fn with_parameter_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `name(type, ...)`.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("{}({})", self.method_name, self.parameter_types.join(", "))
    }
}

/// The language-level element behind a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    /// A benchmark class.
    Class(ClassSource),
    /// A benchmark method.
    Method(MethodSource),
}

/// Descriptor of the engine root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDescriptor {
    unique_id: UniqueId,
    display_name: String,
    #[serde(default)]
    tags: Vec<BenchmarkTag>,
}

impl EngineDescriptor {
    /// Creates an engine descriptor with id `[engine:<engine_id>]`.
    #[must_use]
    pub fn new(engine_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            unique_id: UniqueId::for_engine(engine_id),
            display_name: display_name.into(),
            tags: Vec::new(),
        }
    }

    /// Sets the declared tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<BenchmarkTag>) -> Self {
        self.tags = tags;
        self
    }
}

impl Descriptor for EngineDescriptor {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn tags(&self) -> &[BenchmarkTag] {
        &self.tags
    }
}

/// Descriptor of a benchmark class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkClassDescriptor {
    unique_id: UniqueId,
    display_name: String,
    #[serde(default)]
    tags: Vec<BenchmarkTag>,
    source: ClassSource,
}

impl BenchmarkClassDescriptor {
    /// Creates a class descriptor below `parent_id`.
    ///
    /// The display name defaults to the simple class name.
    #[must_use]
    pub fn new(parent_id: &UniqueId, source: ClassSource) -> Self {
        Self {
            unique_id: parent_id.append("class", source.class_name.clone()),
            display_name: source.simple_name().to_string(),
            tags: Vec::new(),
            source,
        }
    }

    /// Sets the declared tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<BenchmarkTag>) -> Self {
        self.tags = tags;
        self
    }

    /// Overrides the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Returns the benchmark class.
    #[must_use]
    pub fn source(&self) -> &ClassSource {
        &self.source
    }
}

impl Descriptor for BenchmarkClassDescriptor {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn tags(&self) -> &[BenchmarkTag] {
        &self.tags
    }

    fn element(&self) -> Option<Element> {
        Some(Element::Class(self.source.clone()))
    }
}

/// Descriptor of a benchmark method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMethodDescriptor {
    unique_id: UniqueId,
    display_name: String,
    #[serde(default)]
    tags: Vec<BenchmarkTag>,
    source: MethodSource,
}

impl BenchmarkMethodDescriptor {
    /// Creates a method descriptor below `parent_id`.
    ///
    /// The display name defaults to the method signature.
    #[must_use]
    pub fn new(parent_id: &UniqueId, source: MethodSource) -> Self {
        let signature = source.signature();
        Self {
            unique_id: parent_id.append("method", signature.clone()),
            display_name: signature,
            tags: Vec::new(),
            source,
        }
    }

    /// Sets the declared tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<BenchmarkTag>) -> Self {
        self.tags = tags;
        self
    }

    /// Overrides the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Returns the benchmark method.
    #[must_use]
    pub fn source(&self) -> &MethodSource {
        &self.source
    }
}

impl Descriptor for BenchmarkMethodDescriptor {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn tags(&self) -> &[BenchmarkTag] {
        &self.tags
    }

    fn element(&self) -> Option<Element> {
        Some(Element::Method(self.source.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_descriptor_identity() {
        let engine = EngineDescriptor::new("benchscope", "Benchscope");
        let class =
            BenchmarkClassDescriptor::new(engine.unique_id(), ClassSource::new("com.acme.ParserBench"));

        assert_eq!(
            class.unique_id().to_string(),
            "[engine:benchscope]/[class:com.acme.ParserBench]"
        );
        assert_eq!(class.display_name(), "ParserBench");
        assert_eq!(
            class.element(),
            Some(Element::Class(ClassSource::new("com.acme.ParserBench")))
        );
    }

    #[test]
    fn test_method_descriptor_identity() {
        let engine = EngineDescriptor::new("benchscope", "Benchscope");
        let source = MethodSource::new(ClassSource::new("Bench"), "parse")
            .with_parameter_types(["String", "int"]);
        let method = BenchmarkMethodDescriptor::new(engine.unique_id(), source.clone());

        assert_eq!(method.display_name(), "parse(String, int)");
        assert_eq!(
            method.unique_id().to_string(),
            "[engine:benchscope]/[method:parse(String, int)]"
        );
        assert_eq!(method.element(), Some(Element::Method(source)));
    }

    #[test]
    fn test_engine_has_no_element() {
        let engine = EngineDescriptor::new("benchscope", "Benchscope");
        assert_eq!(engine.element(), None);
        assert!(engine.tags().is_empty());
    }

    #[test]
    fn test_simple_name_without_package() {
        assert_eq!(ClassSource::new("Bench").simple_name(), "Bench");
    }
}
