//! Error types for the benchscope crate.
//!
//! Errors fall into a small taxonomy: precondition violations raised while
//! building contexts, typed-access errors from the scoped store, aggregated
//! release failures raised when a context closes, and failures reported by
//! collaborators (listeners, configuration sources).

use crate::store::Namespace;
use thiserror::Error;

/// The main error type for benchscope operations.
#[derive(Debug, Error)]
pub enum BenchscopeError {
    /// A construction precondition was violated.
    #[error("{0}")]
    Precondition(#[from] PreconditionViolation),

    /// A typed store access failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// One or more tracked resources failed to release.
    #[error("{0}")]
    Close(#[from] CloseError),

    /// An execution listener rejected an event.
    #[error("{0}")]
    Listener(#[from] ListenerError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A report entry was malformed.
    #[error("Invalid report entry: {0}")]
    InvalidReportEntry(String),

    /// A unique id could not be parsed.
    #[error("Invalid unique id: {0}")]
    InvalidUniqueId(String),

    /// A tag name was rejected.
    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Raised when a required collaborator is missing at construction time.
///
/// This is a programming error on the caller's side; it is never retried.
#[derive(Debug, Clone, Error)]
#[error("Precondition violated: {message}")]
pub struct PreconditionViolation {
    /// What was missing or malformed.
    pub message: String,
}

impl PreconditionViolation {
    /// Creates a new precondition violation.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from typed access to a scoped store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A value exists under the key but has a different type.
    #[error("Value stored under {namespace}/'{key}' is not of required type {required}")]
    TypeMismatch {
        /// The namespace of the lookup.
        namespace: Namespace,
        /// The key of the lookup.
        key: String,
        /// The type the caller asked for.
        required: &'static str,
    },
}

impl StoreError {
    /// Creates a type mismatch error for `T`.
    #[must_use]
    pub fn type_mismatch<T: ?Sized>(namespace: &Namespace, key: &str) -> Self {
        Self::TypeMismatch {
            namespace: namespace.clone(),
            key: key.to_string(),
            required: std::any::type_name::<T>(),
        }
    }
}

/// A single resource that failed to release.
#[derive(Debug)]
pub struct ReleaseFailure {
    /// Namespace the resource was stored under.
    pub namespace: Namespace,
    /// Key the resource was stored under.
    pub key: String,
    /// The underlying failure.
    pub error: anyhow::Error,
}

impl ReleaseFailure {
    /// Creates a new release failure.
    #[must_use]
    pub fn new(namespace: Namespace, key: impl Into<String>, error: anyhow::Error) -> Self {
        Self {
            namespace,
            key: key.into(),
            error,
        }
    }
}

impl std::fmt::Display for ReleaseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/'{}': {:#}", self.namespace, self.key, self.error)
    }
}

/// Aggregated failure raised after every tracked resource of a scope was
/// attempted.
#[derive(Debug, Error)]
#[error(
    "Failed to release {} resource(s) in scope {owner}: {}",
    .failures.len(),
    render_failures(.failures)
)]
pub struct CloseError {
    /// Unique id of the scope that owned the resources.
    pub owner: String,
    /// Individual failures, in release order.
    pub failures: Vec<ReleaseFailure>,
}

impl CloseError {
    /// Creates a new close error.
    #[must_use]
    pub fn new(owner: impl Into<String>, failures: Vec<ReleaseFailure>) -> Self {
        Self {
            owner: owner.into(),
            failures,
        }
    }

    /// Returns the keys of the resources that failed, in release order.
    #[must_use]
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.key.as_str()).collect()
    }
}

fn render_failures(failures: &[ReleaseFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raised by an execution listener that could not accept an event.
#[derive(Debug, Clone, Error)]
#[error("Listener error: {message}")]
pub struct ListenerError {
    /// The error message.
    pub message: String,
}

impl ListenerError {
    /// Creates a new listener error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised while loading configuration parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration source could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration source was not valid JSON.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration document had an unsupported shape.
    #[error("Unsupported configuration document: {0}")]
    Shape(String),

    /// A parameter held a value that could not be interpreted.
    #[error("Invalid value '{value}' for configuration parameter '{key}'")]
    InvalidValue {
        /// The parameter key.
        key: String,
        /// The offending value.
        value: String,
    },
}
