//! Reporting collaborator handed to each analysis component.
//!
//! Components never reach for a process-wide logger. They are constructed
//! with a [`Diagnostics`] implementation and report recoverable problems
//! (skipped lines, dangling references, negative durations) through it.
//!
//! - [`TracingDiagnostics`] forwards to `tracing`, tagging every event with
//!   the component name.
//! - [`CollectingDiagnostics`] keeps entries in memory so callers can inspect
//!   or export them after a pass.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Sink for messages produced during an analysis pass.
pub trait Diagnostics: Send + Debug {
    /// Record one message.
    fn record(&self, severity: Severity, message: &str);

    fn debug(&self, message: &str) {
        self.record(Severity::Debug, message);
    }

    fn info(&self, message: &str) {
        self.record(Severity::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.record(Severity::Error, message);
    }
}

/// Forwards diagnostics to the `tracing` subscriber installed by the binary.
#[derive(Debug, Clone)]
pub struct TracingDiagnostics {
    component: &'static str,
}

impl TracingDiagnostics {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Boxed instance, ready to hand to a component constructor.
    pub fn boxed(component: &'static str) -> Box<dyn Diagnostics> {
        Box::new(Self::new(component))
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Diagnostics for TracingDiagnostics {
    fn record(&self, severity: Severity, message: &str) {
        let component = self.component;
        match severity {
            Severity::Debug => tracing::debug!(component, "{}", message),
            Severity::Info => tracing::info!(component, "{}", message),
            Severity::Warning => tracing::warn!(component, "{}", message),
            Severity::Error => tracing::error!(component, "{}", message),
        }
    }
}

/// A recorded diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    pub severity: Severity,
    pub message: String,
}

/// Keeps every entry in memory.
///
/// Clones share the same buffer, so one handle can be given to a component
/// while another is kept to read the entries back.
#[derive(Debug, Clone, Default)]
pub struct CollectingDiagnostics {
    entries: Arc<Mutex<Vec<DiagnosticEntry>>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A boxed handle sharing this collector's buffer.
    pub fn handle(&self) -> Box<dyn Diagnostics> {
        Box::new(self.clone())
    }

    /// Snapshot of all entries recorded so far.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries.lock().clone()
    }

    /// Messages recorded at exactly `severity`.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.lock().iter().filter(|e| e.severity == severity).count()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn record(&self, severity: Severity, message: &str) {
        self.entries.lock().push(DiagnosticEntry {
            severity,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_shares_buffer() {
        let collector = CollectingDiagnostics::new();
        let handle = collector.handle();

        handle.warn("line 3 is not valid JSON");
        handle.info("finished");
        handle.warn("job 9 never started");

        assert_eq!(collector.entries().len(), 3);
        assert_eq!(collector.count(Severity::Warning), 2);
        assert_eq!(
            collector.messages(Severity::Info),
            vec!["finished".to_string()]
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Info > Severity::Debug);
    }

    #[test]
    fn test_tracing_diagnostics_without_subscriber() {
        // No subscriber installed: recording must still be a no-op, not a panic.
        let diagnostics = TracingDiagnostics::new("event_log");
        diagnostics.warn("nothing listens");
        assert_eq!(diagnostics.component(), "event_log");
    }
}
