//! Global `tracing` subscriber installation.
//!
//! The library itself only emits events; binaries and test harnesses embedding
//! it call one of these once at startup.

use crate::errors::BenchscopeError;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVE: &str = "benchscope=info";

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs a human-readable subscriber.
///
/// `RUST_LOG` takes precedence over `default_directive`.
///
/// # Errors
///
/// Returns `BenchscopeError::Internal` if a global subscriber is already set.
pub fn init_tracing(default_directive: &str) -> Result<(), BenchscopeError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_target(true)
        .try_init()
        .map_err(|e| BenchscopeError::Internal(format!("failed to install subscriber: {e}")))
}

/// Installs a subscriber that writes one JSON object per event.
///
/// # Errors
///
/// Returns `BenchscopeError::Internal` if a global subscriber is already set.
pub fn init_json_tracing(default_directive: &str) -> Result<(), BenchscopeError> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(default_directive))
        .with_current_span(false)
        .try_init()
        .map_err(|e| BenchscopeError::Internal(format!("failed to install subscriber: {e}")))
}
