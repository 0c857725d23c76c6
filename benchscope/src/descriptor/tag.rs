//! Benchmark tags and tag sets.

use crate::errors::BenchscopeError;
use serde::{Deserialize, Serialize};

/// Characters that may not appear in a tag name.
pub const RESERVED_CHARACTERS: [char; 6] = [',', '(', ')', '&', '|', '!'];

/// A validated tag declared on a benchmark class or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BenchmarkTag {
    name: String,
}

impl BenchmarkTag {
    /// Creates a tag, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `BenchscopeError::InvalidTag` if the name is blank or contains
    /// whitespace, control characters or reserved characters.
    pub fn new(name: impl AsRef<str>) -> Result<Self, BenchscopeError> {
        let name = name.as_ref().trim();

        if name.is_empty() {
            return Err(BenchscopeError::InvalidTag("tag name must not be blank".to_string()));
        }
        if let Some(c) = name
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || RESERVED_CHARACTERS.contains(c))
        {
            return Err(BenchscopeError::InvalidTag(format!(
                "tag name '{name}' contains illegal character {c:?}"
            )));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Returns the tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TryFrom<String> for BenchmarkTag {
    type Error = BenchscopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BenchmarkTag> for String {
    fn from(tag: BenchmarkTag) -> Self {
        tag.name
    }
}

impl std::fmt::Display for BenchmarkTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// An insertion-ordered set of tag names.
///
/// Equality ignores order; iteration follows first insertion. Serializes as
/// a plain list; duplicates in a loaded list are dropped.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    names: Vec<String>,
}

impl TagSet {
    /// Creates an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from declared tags, dropping duplicates.
    #[must_use]
    pub fn from_tags(tags: &[BenchmarkTag]) -> Self {
        tags.iter().map(BenchmarkTag::name).collect()
    }

    /// Adds a name; returns false if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Returns true if the set contains `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Iterates names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Consumes the set, returning names in insertion order.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.names
    }
}

impl PartialEq for TagSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|n| other.contains(n))
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl From<Vec<String>> for TagSet {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.names
    }
}

impl<S: Into<String>> Extend<S> for TagSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}
