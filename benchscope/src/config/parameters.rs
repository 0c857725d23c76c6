//! Configuration parameter sources.

use crate::errors::ConfigError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A shared, read-only `key -> value` lookup queried by every context.
///
/// Implementations must be safe to query from many contexts at once.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigurationParameters: Send + Sync {
    /// Returns the value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns every key this source knows about.
    fn keys(&self) -> Vec<String>;

    /// Interprets the value for `key` as a boolean.
    ///
    /// Only `true` (case-insensitive, surrounding whitespace ignored) is true;
    /// any other present value is false.
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Returns the value for `key`, or `default` when absent.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Configuration parameters backed by an in-memory map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapConfigurationParameters {
    values: BTreeMap<String, String>,
}

impl MapConfigurationParameters {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Creates a parameter set from key/value pairs.
    #[must_use]
    pub fn from_map<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses a JSON object into parameters.
    ///
    /// Nested objects are flattened with `.` separators, scalars are
    /// stringified, arrays of scalars are joined with `,` and nulls are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for invalid JSON and `ConfigError::Shape`
    /// when the document is not an object or nests arrays.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let document: serde_json::Value = serde_json::from_str(input)?;
        let serde_json::Value::Object(map) = document else {
            return Err(ConfigError::Shape("top-level value must be an object".to_string()));
        };

        let mut values = BTreeMap::new();
        flatten_into(&mut values, None, &map)?;
        Ok(Self { values })
    }

    /// Reads a JSON file into parameters. See [`Self::from_json_str`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`Self::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let params = Self::from_json_str(&contents)?;
        debug!(path = %path.display(), count = params.len(), "Loaded configuration file");
        Ok(params)
    }

    /// Collects parameters from the process environment.
    ///
    /// See [`Self::from_vars`] for the naming rules.
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Collects parameters from `NAME=value` pairs whose name starts with
    /// `<PREFIX>_`.
    ///
    /// Names are lowercased, `__` becomes `-` and `_` becomes `.`, so
    /// `BENCHSCOPE_EXECUTION_FAIL__FAST` maps to
    /// `benchscope.execution.fail-fast`.
    #[must_use]
    pub fn from_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let wanted = format!("{}_", prefix.to_ascii_uppercase());
        let values = vars
            .into_iter()
            .filter(|(name, _)| name.to_ascii_uppercase().starts_with(&wanted))
            .map(|(name, value)| (env_name_to_key(&name), value))
            .collect();
        Self { values }
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigurationParameters for MapConfigurationParameters {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

fn env_name_to_key(name: &str) -> String {
    name.to_ascii_lowercase().replace("__", "-").replace('_', ".")
}

fn flatten_into(
    out: &mut BTreeMap<String, String>,
    prefix: Option<&str>,
    map: &serde_json::Map<String, serde_json::Value>,
) -> Result<(), ConfigError> {
    for (name, value) in map {
        let key = prefix.map_or_else(|| name.clone(), |p| format!("{p}.{name}"));
        match value {
            serde_json::Value::Null => {}
            serde_json::Value::Object(nested) => flatten_into(out, Some(&key), nested)?,
            serde_json::Value::Array(items) => {
                let rendered = items
                    .iter()
                    .map(|item| {
                        scalar_to_string(item).ok_or_else(|| {
                            ConfigError::Shape(format!("array '{key}' must contain only scalars"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                out.insert(key, rendered.join(","));
            }
            scalar => {
                if let Some(rendered) = scalar_to_string(scalar) {
                    out.insert(key, rendered);
                }
            }
        }
    }
    Ok(())
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Stacks several parameter sources; the first layer holding a key wins.
#[derive(Clone, Default)]
pub struct LayeredConfigurationParameters {
    layers: Vec<Arc<dyn ConfigurationParameters>>,
}

impl LayeredConfigurationParameters {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer with lower priority than every existing layer.
    #[must_use]
    pub fn with_layer(mut self, layer: Arc<dyn ConfigurationParameters>) -> Self {
        self.layers.push(layer);
        self
    }

    /// Returns the number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl ConfigurationParameters for LayeredConfigurationParameters {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }

    fn keys(&self) -> Vec<String> {
        self.layers
            .iter()
            .flat_map(|layer| layer.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl std::fmt::Debug for LayeredConfigurationParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredConfigurationParameters")
            .field("layer_count", &self.layers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_map_parameters() {
        let params = MapConfigurationParameters::new()
            .with("benchscope.execution.parallel", " TRUE ")
            .with("mode", "fast");

        assert_eq!(params.get("mode"), Some("fast".to_string()));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.get_bool("benchscope.execution.parallel"), Some(true));
        assert_eq!(params.get_bool("mode"), Some(false));
        assert_eq!(params.get_or("missing", "fallback"), "fallback");
        assert_eq!(params.keys(), vec!["benchscope.execution.parallel", "mode"]);
    }

    #[test]
    fn test_from_json_flattens() {
        let params = MapConfigurationParameters::from_json_str(
            r#"{
                "benchscope": {"execution": {"parallel": true, "forks": 2}},
                "profilers": ["gc", "stack"],
                "unused": null
            }"#,
        )
        .unwrap();

        assert_eq!(params.get("benchscope.execution.parallel"), Some("true".to_string()));
        assert_eq!(params.get("benchscope.execution.forks"), Some("2".to_string()));
        assert_eq!(params.get("profilers"), Some("gc,stack".to_string()));
        assert_eq!(params.get("unused"), None);
    }

    #[test]
    fn test_from_json_rejects_bad_shapes() {
        assert!(matches!(
            MapConfigurationParameters::from_json_str("[1, 2]"),
            Err(ConfigError::Shape(_))
        ));
        assert!(matches!(
            MapConfigurationParameters::from_json_str(r#"{"a": [{"b": 1}]}"#),
            Err(ConfigError::Shape(_))
        ));
        assert!(matches!(
            MapConfigurationParameters::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mode": "quick"}}"#).unwrap();

        let params = MapConfigurationParameters::from_json_file(file.path()).unwrap();
        assert_eq!(params.get("mode"), Some("quick".to_string()));

        assert!(matches!(
            MapConfigurationParameters::from_json_file("/nonexistent/benchscope.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_from_vars() {
        let vars = vec![
            ("BENCHSCOPE_EXECUTION_PARALLEL".to_string(), "true".to_string()),
            ("BENCHSCOPE_EXECUTION_FAIL__FAST".to_string(), "false".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ];

        let params = MapConfigurationParameters::from_vars("benchscope", vars);

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("benchscope.execution.parallel"), Some("true".to_string()));
        assert_eq!(params.get("benchscope.execution.fail-fast"), Some("false".to_string()));
    }

    #[test]
    fn test_layered_first_hit_wins() {
        let explicit = MapConfigurationParameters::new().with("mode", "explicit");
        let file = MapConfigurationParameters::new()
            .with("mode", "file")
            .with("forks", "3");

        let layered = LayeredConfigurationParameters::new()
            .with_layer(Arc::new(explicit))
            .with_layer(Arc::new(file));

        assert_eq!(layered.layer_count(), 2);
        assert_eq!(layered.get("mode"), Some("explicit".to_string()));
        assert_eq!(layered.get("forks"), Some("3".to_string()));
        assert_eq!(layered.keys(), vec!["forks", "mode"]);
    }

    #[test]
    fn test_layered_consults_mocked_layer() {
        let mut mock = MockConfigurationParameters::new();
        mock.expect_get()
            .withf(|key| key == "mode")
            .times(1)
            .returning(|_| Some("mocked".to_string()));

        let layered = LayeredConfigurationParameters::new().with_layer(Arc::new(mock));
        assert_eq!(layered.get("mode"), Some("mocked".to_string()));
    }
}
