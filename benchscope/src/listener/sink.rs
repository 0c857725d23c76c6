//! Execution listener trait and implementations.

use super::{ExecutionResult, ReportEntry, Timestamp};
use crate::descriptor::{Descriptor, UniqueId};
use crate::errors::ListenerError;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info, Level};
use uuid::Uuid;

/// Receives lifecycle and reporting events from execution contexts.
///
/// One listener is shared by every context in a tree, so implementations must
/// accept calls from many threads at once.
pub trait ExecutionListener: Send + Sync {
    /// Called before a node starts executing.
    fn execution_started(&self, _descriptor: &dyn Descriptor) {}

    /// Called after a node and all of its children finished executing.
    fn execution_finished(&self, _descriptor: &dyn Descriptor, _result: &ExecutionResult) {}

    /// Called when a node publishes a report entry.
    ///
    /// The listener assigns the entry's timestamp.
    fn reporting_entry_published(
        &self,
        descriptor: &dyn Descriptor,
        entry: &ReportEntry,
    ) -> Result<(), ListenerError>;
}

/// A listener that discards all events.
///
/// Used as the default when no listener is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpListener;

impl ExecutionListener for NoOpListener {
    fn reporting_entry_published(
        &self,
        _descriptor: &dyn Descriptor,
        _entry: &ReportEntry,
    ) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// A listener that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingListener {
    level: Level,
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingListener {
    /// Creates a logging listener with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging listener.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log(&self, descriptor: &dyn Descriptor, event: &str, detail: &str) {
        let unique_id = descriptor.unique_id().to_string();
        if self.level == Level::DEBUG {
            debug!(
                unique_id = %unique_id,
                display_name = %descriptor.display_name(),
                detail = %detail,
                "Execution {}", event
            );
        } else {
            info!(
                unique_id = %unique_id,
                display_name = %descriptor.display_name(),
                detail = %detail,
                "Execution {}", event
            );
        }
    }
}

impl ExecutionListener for LoggingListener {
    fn execution_started(&self, descriptor: &dyn Descriptor) {
        self.log(descriptor, "started", "");
    }

    fn execution_finished(&self, descriptor: &dyn Descriptor, result: &ExecutionResult) {
        self.log(descriptor, "finished", &format!("{result:?}"));
    }

    fn reporting_entry_published(
        &self,
        descriptor: &dyn Descriptor,
        entry: &ReportEntry,
    ) -> Result<(), ListenerError> {
        let timestamp = Utc::now().to_rfc3339();
        self.log(
            descriptor,
            "report entry",
            &format!("{timestamp} {:?}", entry.values()),
        );
        Ok(())
    }
}

/// A report entry as received by a [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEntry {
    /// Id of the publishing node.
    pub unique_id: UniqueId,
    /// The published pairs.
    pub entry: ReportEntry,
    /// When the listener received the entry.
    pub timestamp: Timestamp,
    /// Time-ordered id of the event.
    pub event_id: Uuid,
}

/// An event recorded by a [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    /// A node started.
    Started(UniqueId),
    /// A node finished.
    Finished(UniqueId, ExecutionResult),
    /// A node published a report entry.
    ReportingEntry(PublishedEntry),
}

/// A listener that records every event, for tests and embedders that consume
/// results after the run.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: RwLock<Vec<ListenerEvent>>,
    reject_entries: Option<String>,
}

impl RecordingListener {
    /// Creates a new recording listener.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a listener that rejects every report entry with `message`.
    #[must_use]
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            reject_entries: Some(message.into()),
        }
    }

    /// Returns all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.read().clone()
    }

    /// Returns all published report entries.
    #[must_use]
    pub fn published_entries(&self) -> Vec<PublishedEntry> {
        self.events
            .read()
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::ReportingEntry(published) => Some(published.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the entries published by one node.
    #[must_use]
    pub fn entries_for(&self, unique_id: &UniqueId) -> Vec<ReportEntry> {
        self.published_entries()
            .into_iter()
            .filter(|published| &published.unique_id == unique_id)
            .map(|published| published.entry)
            .collect()
    }

    /// Returns the finish results in the order they were reported.
    #[must_use]
    pub fn finished(&self) -> Vec<(UniqueId, ExecutionResult)> {
        self.events
            .read()
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::Finished(id, result) => Some((id.clone(), result.clone())),
                _ => None,
            })
            .collect()
    }

    /// Returns the result reported for one node.
    #[must_use]
    pub fn result_for(&self, unique_id: &UniqueId) -> Option<ExecutionResult> {
        self.finished()
            .into_iter()
            .find(|(id, _)| id == unique_id)
            .map(|(_, result)| result)
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl ExecutionListener for RecordingListener {
    fn execution_started(&self, descriptor: &dyn Descriptor) {
        self.events
            .write()
            .push(ListenerEvent::Started(descriptor.unique_id().clone()));
    }

    fn execution_finished(&self, descriptor: &dyn Descriptor, result: &ExecutionResult) {
        self.events.write().push(ListenerEvent::Finished(
            descriptor.unique_id().clone(),
            result.clone(),
        ));
    }

    fn reporting_entry_published(
        &self,
        descriptor: &dyn Descriptor,
        entry: &ReportEntry,
    ) -> Result<(), ListenerError> {
        if let Some(ref message) = self.reject_entries {
            return Err(ListenerError::new(message.clone()));
        }

        self.events
            .write()
            .push(ListenerEvent::ReportingEntry(PublishedEntry {
                unique_id: descriptor.unique_id().clone(),
                entry: entry.clone(),
                timestamp: Utc::now(),
                event_id: Uuid::now_v7(),
            }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::EngineDescriptor;

    fn engine() -> EngineDescriptor {
        EngineDescriptor::new("benchscope", "Benchscope")
    }

    #[test]
    fn test_noop_listener() {
        let entry = ReportEntry::from_value("k", "v").unwrap();
        assert!(NoOpListener.reporting_entry_published(&engine(), &entry).is_ok());
        NoOpListener.execution_started(&engine());
    }

    #[test]
    fn test_logging_listener() {
        let entry = ReportEntry::from_value("k", "v").unwrap();
        let listener = LoggingListener::debug();

        listener.execution_started(&engine());
        assert!(listener.reporting_entry_published(&engine(), &entry).is_ok());
        listener.execution_finished(&engine(), &ExecutionResult::Successful);
    }

    #[test]
    fn test_recording_listener() {
        let listener = RecordingListener::new();
        let descriptor = engine();
        let entry = ReportEntry::from_value("score", "1").unwrap();

        listener.execution_started(&descriptor);
        listener.reporting_entry_published(&descriptor, &entry).unwrap();
        listener.execution_finished(&descriptor, &ExecutionResult::Successful);

        assert_eq!(listener.len(), 3);
        assert_eq!(listener.entries_for(descriptor.unique_id()), vec![entry]);
        assert_eq!(
            listener.result_for(descriptor.unique_id()),
            Some(ExecutionResult::Successful)
        );

        listener.clear();
        assert!(listener.is_empty());
    }

    #[test]
    fn test_recording_listener_stamps_entries() {
        let listener = RecordingListener::new();
        let before = Utc::now();
        listener
            .reporting_entry_published(&engine(), &ReportEntry::from_value("a", "1").unwrap())
            .unwrap();
        listener
            .reporting_entry_published(&engine(), &ReportEntry::from_value("b", "2").unwrap())
            .unwrap();

        let published = listener.published_entries();
        assert!(published[0].timestamp >= before);
        assert_ne!(published[0].event_id, published[1].event_id);
    }

    #[test]
    fn test_rejecting_listener() {
        let listener = RecordingListener::rejecting("sink closed");
        let err = listener
            .reporting_entry_published(&engine(), &ReportEntry::from_value("a", "1").unwrap())
            .unwrap_err();

        assert_eq!(err.message, "sink closed");
        assert!(listener.is_empty());
    }
}
