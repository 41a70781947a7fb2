//! Per-execution event log.
//!
//! Every page execution gets its own [`Tracer`]. Providers and fragments
//! record lifecycle events into it from any task, and the page derives a
//! [`Statistics`] snapshot from the log once all fragments have completed.

mod statistics;

pub use statistics::Statistics;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    FragmentStarted,
    FragmentCompleted,
    FallbackStarted,
    FallbackCompleted,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub event_type: EventType,
    pub position: Position,
    pub source: String,
    pub non_empty: bool,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TraceEvent {
    fn new(event_type: EventType, position: &Position, source: &str, non_empty: bool) -> Self {
        Self {
            event_type,
            position: position.clone(),
            source: source.to_string(),
            non_empty,
            message: None,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug)]
struct TracerInner {
    started_at: DateTime<Utc>,
    log_events: bool,
    events: Mutex<Vec<TraceEvent>>,
}

/// Append-only event sink shared by everything running in one execution.
///
/// The default tracer drops every event.
#[derive(Debug, Clone, Default)]
pub struct Tracer {
    inner: Option<Arc<TracerInner>>,
}

impl Tracer {
    /// A tracer that records events.
    pub fn new() -> Self {
        Self::recording(false)
    }

    /// A tracer that records events and also emits them as debug logs.
    pub fn logging() -> Self {
        Self::recording(true)
    }

    pub fn noop() -> Self {
        Self::default()
    }

    fn recording(log_events: bool) -> Self {
        Self {
            inner: Some(Arc::new(TracerInner {
                started_at: Utc::now(),
                log_events,
                events: Mutex::new(Vec::new()),
            })),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.inner.is_some()
    }

    /// When the execution began; the reference point of all latencies.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner
            .as_ref()
            .map(|inner| inner.started_at)
            .unwrap_or_else(Utc::now)
    }

    pub fn trace(&self, event: TraceEvent) {
        let Some(inner) = &self.inner else {
            return;
        };

        if inner.log_events {
            tracing::debug!(
                event = ?event.event_type,
                position = %event.position,
                source = %event.source,
                non_empty = event.non_empty,
                message = event.message.as_deref().unwrap_or(""),
                "trace event"
            );
        }

        inner
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    pub fn started(&self, position: &Position, source: &str) {
        self.trace(TraceEvent::new(
            EventType::FragmentStarted,
            position,
            source,
            false,
        ));
    }

    pub fn completed(&self, position: &Position, source: &str, non_empty: bool) {
        self.trace(TraceEvent::new(
            EventType::FragmentCompleted,
            position,
            source,
            non_empty,
        ));
    }

    pub fn fallback_started(&self, position: &Position, source: &str) {
        self.trace(TraceEvent::new(
            EventType::FallbackStarted,
            position,
            source,
            false,
        ));
    }

    pub fn fallback_completed(&self, position: &Position, source: &str, non_empty: bool) {
        self.trace(TraceEvent::new(
            EventType::FallbackCompleted,
            position,
            source,
            non_empty,
        ));
    }

    pub fn error(&self, position: &Position, source: &str, message: impl Into<String>) {
        let mut event = TraceEvent::new(EventType::Error, position, source, false);
        event.message = Some(message.into());
        self.trace(event);
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        match &self.inner {
            Some(inner) => inner
                .events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            None => Vec::new(),
        }
    }

    /// Snapshot of the events recorded so far.
    pub fn statistics(&self) -> Statistics {
        Statistics::from_events(self.started_at(), &self.events(), Utc::now())
    }
}
