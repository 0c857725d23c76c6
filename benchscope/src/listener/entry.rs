//! Report entries and execution results.

use crate::errors::BenchscopeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point in time assigned by a listener.
pub type Timestamp = DateTime<Utc>;

/// A set of string key/value pairs published by a running node.
///
/// Entries carry no timestamp of their own; listeners stamp them on receipt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportEntry {
    values: BTreeMap<String, String>,
}

impl ReportEntry {
    /// Builds an entry from key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns `BenchscopeError::InvalidReportEntry` if any key or value is
    /// blank.
    pub fn from_map<I, K, V>(values: I) -> Result<Self, BenchscopeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entry = Self::default();
        for (key, value) in values {
            entry.add(key.into(), value.into())?;
        }
        Ok(entry)
    }

    /// Builds an entry holding a single pair.
    ///
    /// # Errors
    ///
    /// Returns `BenchscopeError::InvalidReportEntry` if the key or value is
    /// blank.
    pub fn from_value(key: impl Into<String>, value: impl Into<String>) -> Result<Self, BenchscopeError> {
        Self::from_map([(key.into(), value.into())])
    }

    fn add(&mut self, key: String, value: String) -> Result<(), BenchscopeError> {
        if key.trim().is_empty() {
            return Err(BenchscopeError::InvalidReportEntry("key must not be blank".to_string()));
        }
        if value.trim().is_empty() {
            return Err(BenchscopeError::InvalidReportEntry(format!(
                "value for key '{key}' must not be blank"
            )));
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns all pairs, ordered by key.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Returns the number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the entry has no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The outcome of executing one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// The node and its children completed.
    Successful,
    /// The node was not run to completion.
    Aborted {
        /// Why the node was aborted.
        reason: String,
    },
    /// The node failed.
    Failed {
        /// The failure message.
        message: String,
    },
}

impl ExecutionResult {
    /// Creates a failed result.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Creates an aborted result.
    #[must_use]
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Returns true for a successful result.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Successful)
    }

    /// Returns true for a failed result.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
