//! Structured event broadcast shared by every model component.
//!
//! Components publish leveled events to an [`EventLog`]; external listeners
//! subscribe to the full stream. Operator-facing diagnostics are additionally
//! forwarded to `tracing`, so a harness only interested in console output can
//! skip subscribing entirely.
//!
//! Failure contract: an error-level event is delivered to every listener
//! before the triggering call returns its `Err`, so a subscriber always sees
//! the cause ahead of the failure signal. The log itself never raises.

use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

/// Severity of a broadcast event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Info,
    Warn,
    Error,
}

/// One structured event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub level: LogLevel,
    /// Component that emitted the event, e.g. `"AgentSet"`.
    pub source: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

type Listener = Box<dyn Fn(&LogEvent) + Send>;

/// Cloneable handle onto a shared listener list.
#[derive(Clone, Default)]
pub struct EventLog {
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for every subsequent event.
    pub fn subscribe(&self, listener: impl Fn(&LogEvent) + Send + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    pub fn trace(&self, source: &'static str, message: impl Into<String>, data: Option<Value>) {
        self.broadcast(LogLevel::Trace, source, message.into(), data);
    }

    pub fn info(&self, source: &'static str, message: impl Into<String>, data: Option<Value>) {
        self.broadcast(LogLevel::Info, source, message.into(), data);
    }

    pub fn warn(&self, source: &'static str, message: impl Into<String>, data: Option<Value>) {
        self.broadcast(LogLevel::Warn, source, message.into(), data);
    }

    /// Broadcasts an error-level event. The caller is expected to return its
    /// own `Err` immediately afterwards.
    pub fn error(&self, source: &'static str, message: impl Into<String>, data: Option<Value>) {
        self.broadcast(LogLevel::Error, source, message.into(), data);
    }

    fn broadcast(&self, level: LogLevel, source: &'static str, message: String, data: Option<Value>) {
        match level {
            LogLevel::Trace => tracing::trace!(source, "{message}"),
            LogLevel::Info => tracing::info!(source, "{message}"),
            LogLevel::Warn => tracing::warn!(source, "{message}"),
            LogLevel::Error => tracing::error!(source, "{message}"),
        }
        let event = LogEvent {
            level,
            source,
            message,
            data,
        };
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(log: &EventLog) -> Arc<Mutex<Vec<LogEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        log.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    #[test]
    fn test_events_reach_every_listener() {
        let log = EventLog::new();
        let first = capture(&log);
        let second = capture(&log);

        log.warn("Test", "saturation", None);

        assert_eq!(first.lock().unwrap().len(), 1);
        assert_eq!(second.lock().unwrap().len(), 1);
        assert_eq!(first.lock().unwrap()[0].level, LogLevel::Warn);
    }

    #[test]
    fn test_event_carries_structured_data() {
        let log = EventLog::new();
        let events = capture(&log);

        log.trace("Test", "tick", Some(serde_json::json!({ "clock_tick": 3 })));

        let events = events.lock().unwrap();
        assert_eq!(events[0].source, "Test");
        assert_eq!(events[0].data.as_ref().unwrap()["clock_tick"], 3);
    }

    #[test]
    fn test_clones_share_the_listener_list() {
        let log = EventLog::new();
        let events = capture(&log);

        let handle = log.clone();
        handle.info("Test", "from clone", None);

        assert_eq!(events.lock().unwrap().len(), 1);
    }
}
