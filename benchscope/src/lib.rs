//! # Benchscope
//!
//! Scoped execution contexts for hierarchical benchmark runners.
//!
//! A run is a tree of nodes (engine, benchmark classes, benchmark methods).
//! Every node gets an execution context that provides:
//!
//! - **Scoped storage**: namespaced values that children inherit by lookup
//!   without copying, with lazy compute-once creation
//! - **Tracked release**: values created through a context are released when
//!   that context closes, and only then
//! - **Reporting**: key/value entries forwarded to a shared listener
//! - **Metadata**: unique id, display name, own tags and shared configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use benchscope::prelude::*;
//! use std::sync::Arc;
//!
//! let plan = BenchmarkPlan::new(EngineDescriptor::new("benchscope", "Benchscope"));
//! let class = plan.class("com.acme.ParserBench").with_method("parse");
//! let plan = plan.with_class(class);
//!
//! let executor = HierarchicalExecutor::new(
//!     Arc::new(LoggingListener::default()),
//!     Arc::new(MapConfigurationParameters::from_env("benchscope")),
//! )?;
//! let summary = executor.execute(&plan, &MyAction);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod descriptor;
pub mod engine;
pub mod errors;
pub mod listener;
pub mod observability;
pub mod store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        ConfigurationParameters, ExecutionSettings, LayeredConfigurationParameters,
        MapConfigurationParameters,
    };
    pub use crate::context::{
        BenchmarkClassContext, BenchmarkMethodContext, ContextBuilder, EngineContext,
        ExecutionContext, NodeContext,
    };
    pub use crate::descriptor::{
        BenchmarkClassDescriptor, BenchmarkMethodDescriptor, BenchmarkTag, ClassSource,
        Descriptor, EngineDescriptor, MethodSource, TagSet, UniqueId,
    };
    pub use crate::engine::{
        BenchmarkAction, BenchmarkPlan, ClassPlan, ExecutionSummary, HierarchicalExecutor,
    };
    pub use crate::errors::{BenchscopeError, CloseError, StoreError};
    pub use crate::listener::{
        ExecutionListener, ExecutionResult, LoggingListener, NoOpListener, RecordingListener,
        ReportEntry,
    };
    pub use crate::store::{
        CloseableResource, Namespace, NamespacedStore, ScopedStore, StoreValue,
    };
}
