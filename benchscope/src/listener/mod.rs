//! Execution listeners receiving lifecycle and reporting events.
//!
//! Contexts never interpret events; they forward them, tagged with their
//! descriptor, to the listener injected at construction.

mod entry;
mod sink;

pub use entry::{ExecutionResult, ReportEntry, Timestamp};
pub use sink::{
    ExecutionListener, ListenerEvent, LoggingListener, NoOpListener, PublishedEntry,
    RecordingListener,
};
