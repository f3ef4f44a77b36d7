//! Diagnostic sink for non-fatal failures.
//!
//! Components receive an `Arc<dyn Diagnostics>` at construction instead of
//! writing to a process-wide event source.

use std::sync::{Mutex, PoisonError};

/// Receives messages about isolated failures (a module that failed to
/// load, a component that could not be activated).
pub trait Diagnostics: Send + Sync {
    /// Report a non-fatal diagnostic.
    fn diagnostic(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn diagnostic(&self, message: &str) {
        tracing::warn!(target: "scaffolder::diagnostics", "{}", message);
    }
}

/// Keeps every diagnostic in memory. Useful for hosts that surface
/// diagnostics after the fact, and for tests.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    messages: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn diagnostic(&self, message: &str) {
        tracing::debug!("diagnostic: {}", message);
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
