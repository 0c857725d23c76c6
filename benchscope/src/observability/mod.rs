//! Observability utilities.

mod subscriber;

pub use subscriber::{init_json_tracing, init_tracing, DEFAULT_DIRECTIVE};
