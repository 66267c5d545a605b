//! Event sink trait and implementations.

use super::EventKind;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, Level};

/// Receives the lifecycle events of pipeline runs.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event.
    ///
    /// # Arguments
    ///
    /// * `kind` - Which lifecycle event happened
    /// * `data` - Event fields; always carries `request_id` and `pipeline`
    async fn emit(&self, kind: EventKind, data: Value);

    /// Emits an event without awaiting. Must never panic.
    fn try_emit(&self, kind: EventKind, data: Value);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _kind: EventKind, _data: Value) {}

    fn try_emit(&self, _kind: EventKind, _data: Value) {}
}

/// Writes events to `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink at the given level. Anything more verbose
    /// than `INFO` logs at `DEBUG`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, kind: EventKind, data: &Value) {
        if self.level <= Level::INFO {
            info!(event = kind.as_str(), data = %data, "Event: {kind}");
        } else {
            debug!(event = kind.as_str(), data = %data, "Event: {kind}");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, kind: EventKind, data: Value) {
        self.log_event(kind, &data);
    }

    fn try_emit(&self, kind: EventKind, data: Value) {
        self.log_event(kind, &data);
    }
}

/// Keeps every event in memory, for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<(EventKind, Value)>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<(EventKind, Value)> {
        self.events.read().clone()
    }

    /// Just the kinds, in emission order.
    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.read().iter().map(|(kind, _)| *kind).collect()
    }

    /// Payloads of every event of `kind`.
    #[must_use]
    pub fn of_kind(&self, kind: EventKind) -> Vec<Value> {
        self.events
            .read()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, data)| data.clone())
            .collect()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true when nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Drops every collected event.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, kind: EventKind, data: Value) {
        self.events.write().push((kind, data));
    }

    fn try_emit(&self, kind: EventKind, data: Value) {
        self.events.write().push((kind, data));
    }
}
