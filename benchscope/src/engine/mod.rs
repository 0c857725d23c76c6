//! Hierarchical execution of benchmark plans.
//!
//! The executor opens one context per node, hands each to a
//! [`BenchmarkAction`], reports lifecycle events to the listener and closes
//! every context once its subtree is done.

mod action;
mod executor;
#[cfg(test)]
mod integration_tests;
mod plan;
mod summary;

pub use action::BenchmarkAction;
pub use executor::HierarchicalExecutor;
pub use plan::{BenchmarkPlan, ClassPlan};
pub use summary::{ExecutionSummary, NodeOutcome};
