//! Store namespaces.

use serde::{Deserialize, Serialize};

/// A namespace partitioning the keys of a scoped store.
///
/// Namespaces compare by value: two namespaces built from equal parts are the
/// same namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    parts: Vec<String>,
}

impl Namespace {
    /// Creates a namespace from its parts.
    #[must_use]
    pub fn create<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the global namespace, which has no parts.
    #[must_use]
    pub fn global() -> Self {
        Self { parts: Vec::new() }
    }

    /// Returns a new namespace with `parts` appended to this one.
    #[must_use]
    pub fn append<I, S>(&self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = self.parts.clone();
        all.extend(parts.into_iter().map(Into::into));
        Self { parts: all }
    }

    /// Returns the parts of this namespace.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Returns true for the global namespace.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::global()
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.parts.is_empty() {
            write!(f, "<global>")
        } else {
            write!(f, "{}", self.parts.join("."))
        }
    }
}
