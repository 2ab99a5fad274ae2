//! Logging setup and the event sink handed to pipeline components.
//!
//! [`init`] installs a `tracing` subscriber with a plain-text file layer that
//! appends to the configured log file, plus a compact stderr layer in
//! verbose mode. Components never call `tracing` directly for per-record events;
//! they receive an [`EventSink`] so tests can capture exactly what was
//! reported.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::error::EnrollError;

/// Severity of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// A single leveled, timestamped log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub level: Level,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only destination for pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Convenience helpers usable through `dyn EventSink`.
impl dyn EventSink + '_ {
    pub fn info(&self, message: impl Into<String>) {
        self.emit(Event::new(Level::Info, message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(Event::new(Level::Warning, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Event::new(Level::Error, message));
    }
}

/// Forwards events to the global `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event.level {
            Level::Info => tracing::info!(target: "enroll", "{}", event.message),
            Level::Warning => tracing::warn!(target: "enroll", "{}", event.message),
            Level::Error => tracing::error!(target: "enroll", "{}", event.message),
        }
    }
}

/// Collects events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages emitted at the given level.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Filter used when `RUST_LOG` is unset. Verbose mode only lowers the level
/// for this crate; HTTP stack internals stay at `info`.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "enroll=debug,info" } else { "info" }
}

/// Installs the global subscriber. The returned guard flushes the file
/// writer on drop and must be held for the lifetime of the process.
pub fn init(log_file: &Path, verbose: bool) -> Result<WorkerGuard, EnrollError> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // The terminal already gets one line per record; echo events only when asked.
    let stderr_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| EnrollError::Config(format!("failed to initialize logging: {e}")))?;

    tracing::info!(log_file = %log_file.display(), "Logging setup complete");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn level_display() {
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Warning.to_string(), "WARNING");
        assert_eq!(Level::Error.to_string(), "ERROR");
    }

    #[test]
    fn memory_sink_keeps_order_and_levels() {
        let sink = Arc::new(MemorySink::new());
        let handle: Arc<dyn EventSink> = sink.clone();

        handle.info("first");
        handle.error("second");
        handle.warning("third");

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].level, Level::Info);
        assert_eq!(events[1].message, "second");
        assert_eq!(sink.messages(Level::Warning), vec!["third".to_string()]);
    }

    #[test]
    fn event_carries_timestamp() {
        let before = Utc::now();
        let event = Event::new(Level::Info, "hello");
        assert!(event.timestamp >= before);
    }

    #[test]
    fn verbose_directive_is_scoped_to_crate() {
        let directive = default_directive(true);
        assert!(directive.split(',').any(|d| d == "enroll=debug"));
        assert!(!directive.split(',').any(|d| d == "debug"));
        assert_eq!(default_directive(false), "info");
        // Both must parse as filter directives.
        EnvFilter::try_new(default_directive(true)).unwrap();
        EnvFilter::try_new(default_directive(false)).unwrap();
    }

    #[test]
    fn tracing_sink_without_subscriber_is_silent() {
        TracingSink.emit(Event::new(Level::Error, "nobody listens"));
    }
}
