//! Typed execution settings resolved from configuration parameters.

use super::ConfigurationParameters;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Runs class subtrees concurrently when `true`.
pub const PARALLEL_KEY: &str = "benchscope.execution.parallel";

/// Aborts the remaining methods of a class after its first failure when `true`.
pub const FAIL_FAST_KEY: &str = "benchscope.execution.fail-fast";

/// Settings consumed by the hierarchical executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Whether sibling class subtrees run concurrently.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Whether a failing method aborts its remaining siblings.
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
}

fn default_parallel() -> bool {
    false
}

fn default_fail_fast() -> bool {
    false
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            fail_fast: default_fail_fast(),
        }
    }
}

impl ExecutionSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets parallel execution.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets fail-fast.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Resolves settings from configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a flag is neither `true` nor
    /// `false`.
    pub fn from_parameters(params: &dyn ConfigurationParameters) -> Result<Self, ConfigError> {
        Ok(Self {
            parallel: read_flag(params, PARALLEL_KEY)?.unwrap_or_else(default_parallel),
            fail_fast: read_flag(params, FAIL_FAST_KEY)?.unwrap_or_else(default_fail_fast),
        })
    }
}

fn read_flag(params: &dyn ConfigurationParameters, key: &str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = params.get(key) else {
        return Ok(None);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigurationParameters;

    #[test]
    fn test_defaults() {
        let settings =
            ExecutionSettings::from_parameters(&MapConfigurationParameters::new()).unwrap();
        assert_eq!(settings, ExecutionSettings::default());
        assert!(!settings.parallel);
    }

    #[test]
    fn test_from_parameters() {
        let params = MapConfigurationParameters::new()
            .with(PARALLEL_KEY, "true")
            .with(FAIL_FAST_KEY, "False");

        let settings = ExecutionSettings::from_parameters(&params).unwrap();
        assert_eq!(settings, ExecutionSettings::new().with_parallel(true));
    }

    #[test]
    fn test_invalid_flag() {
        let params = MapConfigurationParameters::new().with(PARALLEL_KEY, "sometimes");

        let err = ExecutionSettings::from_parameters(&params).unwrap_err();
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let settings: ExecutionSettings = serde_json::from_str(r#"{"fail_fast": true}"#).unwrap();
        assert!(settings.fail_fast);
        assert!(!settings.parallel);
    }
}
