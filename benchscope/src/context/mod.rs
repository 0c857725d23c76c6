//! Execution contexts.
//!
//! This module provides:
//! - The [`ExecutionContext`] trait shared by every level of the tree
//! - A generic [`NodeContext`] with engine, class and method aliases
//! - A [`ContextBuilder`] that checks required collaborators

mod builder;
mod node;
mod variants;

pub use builder::ContextBuilder;
pub use node::{same_context, ExecutionContext, NodeContext};
pub use variants::{BenchmarkClassContext, BenchmarkMethodContext, EngineContext};
