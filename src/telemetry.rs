//! Telemetry utilities for command timing and span construction.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one poll/process/acknowledge cycle.
    pub fn batch(size: usize) -> Span {
        info_span!("batch", size = size)
    }

    /// Span for one envelope.
    pub fn envelope(user_id: &str, client_id: &str) -> Span {
        info_span!("envelope", user_id = %user_id, client_id = %client_id)
    }

    /// Span for one command execution.
    pub fn command(name: &str, channel: &str) -> Span {
        info_span!("command", name = %name, channel = %channel)
    }
}
