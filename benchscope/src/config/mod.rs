//! Configuration parameters shared by every context in a tree.
//!
//! Parameters are a flat, read-only `key -> value` lookup. They can be built
//! explicitly, loaded from JSON documents or environment variables, and
//! stacked so that explicit values override environment values which
//! override file values.

mod parameters;
mod settings;

pub use parameters::{
    ConfigurationParameters, LayeredConfigurationParameters, MapConfigurationParameters,
};
pub use settings::{ExecutionSettings, FAIL_FAST_KEY, PARALLEL_KEY};

#[cfg(test)]
pub use parameters::MockConfigurationParameters;
