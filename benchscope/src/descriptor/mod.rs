//! Descriptors identifying nodes of the benchmark tree.
//!
//! Descriptors are built by the discovery layer before any context exists and
//! are immutable afterwards. Contexts only read them.

mod nodes;
mod tag;
mod unique_id;

pub use nodes::{
    BenchmarkClassDescriptor, BenchmarkMethodDescriptor, ClassSource, Descriptor, Element,
    EngineDescriptor, MethodSource,
};
pub use tag::{BenchmarkTag, TagSet};
pub use unique_id::{Segment, UniqueId};
