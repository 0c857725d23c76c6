//! Structured unique ids for tree nodes.

use crate::errors::BenchscopeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// One `[kind:value]` segment of a unique id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// The segment kind, e.g. `engine`, `class`, `method`.
    pub kind: String,
    /// The segment value.
    pub value: String,
}

impl Segment {
    /// Creates a new segment.
    #[must_use]
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}]", self.kind, self.value)
    }
}

/// Identifies a node by the path of segments from the engine root.
///
/// Rendered as `[engine:benchscope]/[class:com.acme.Bench]/[method:run()]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueId {
    segments: Vec<Segment>,
}

static SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:\[\]/]+):([^\[\]]*)$").expect("segment pattern is a valid regex")
});

impl UniqueId {
    /// Creates a root id for an engine.
    #[must_use]
    pub fn for_engine(engine_id: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::new("engine", engine_id)],
        }
    }

    /// Parses the rendered form of a unique id.
    ///
    /// # Errors
    ///
    /// Returns `BenchscopeError::InvalidUniqueId` if any segment is malformed.
    pub fn parse(input: &str) -> Result<Self, BenchscopeError> {
        let inner = input
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| BenchscopeError::InvalidUniqueId(format!("'{input}' is not bracketed")))?;

        let segments = inner
            .split("]/[")
            .map(|part| {
                SEGMENT
                    .captures(part)
                    .map(|caps| Segment::new(&caps[1], &caps[2]))
                    .ok_or_else(|| {
                        BenchscopeError::InvalidUniqueId(format!(
                            "malformed segment '[{part}]' in '{input}'"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    /// Returns a new id with a segment appended.
    #[must_use]
    pub fn append(&self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::new(kind, value));
        Self { segments }
    }

    /// Returns the id of the parent node, if this is not a root id.
    #[must_use]
    pub fn parent_id(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns the segments of this id.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the last segment.
    #[must_use]
    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Returns the engine id of the root segment.
    #[must_use]
    pub fn engine_id(&self) -> Option<&str> {
        self.segments
            .first()
            .filter(|s| s.kind == "engine")
            .map(|s| s.value.as_str())
    }
}

impl std::fmt::Display for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.segments.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join("/"))
    }
}

impl std::str::FromStr for UniqueId {
    type Err = BenchscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
