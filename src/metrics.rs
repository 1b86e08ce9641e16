//! Prometheus metrics collection for frontend-manager.
//!
//! Metrics are exposed as text on the HTTP listener next to `/health`.
//!
//! - `frontend_messages_received_total` - Raw queue messages received
//! - `frontend_messages_dropped_total` - Raw messages dropped as unparseable
//! - `frontend_commands_total{command}` - Commands dispatched by name
//! - `frontend_command_duration_seconds{command}` - Handler latency histogram
//! - `frontend_publishes_total{outcome}` - Broker publishes by outcome

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Raw queue messages received.
pub static MESSAGES_RECEIVED: OnceLock<IntCounter> = OnceLock::new();

/// Raw queue messages dropped without processing (bad JSON, no `msg`).
pub static MESSAGES_DROPPED: OnceLock<IntCounter> = OnceLock::new();

/// Batch delete calls that succeeded.
pub static BATCHES_DELETED: OnceLock<IntCounter> = OnceLock::new();

/// Envelopes rejected for missing identity fields.
pub static ENVELOPES_REJECTED: OnceLock<IntCounter> = OnceLock::new();

/// Consumer loop restarts by the supervisor.
pub static LOOP_RESTARTS: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Command Metrics
// ========================================================================

/// Commands dispatched by name.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command handler latency by name.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Command errors by name and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Broker publishes by outcome (`ok` / `error`).
pub static PUBLISHES: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Called once at startup. Until then every `record_*` call is a no-op.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(MESSAGES_RECEIVED, IntCounter::new("frontend_messages_received_total", "Raw queue messages received"));
    register!(MESSAGES_DROPPED, IntCounter::new("frontend_messages_dropped_total", "Raw queue messages dropped as unparseable"));
    register!(BATCHES_DELETED, IntCounter::new("frontend_batches_deleted_total", "Batch delete calls completed"));
    register!(ENVELOPES_REJECTED, IntCounter::new("frontend_envelopes_rejected_total", "Envelopes missing identity fields"));
    register!(LOOP_RESTARTS, IntCounter::new("frontend_loop_restarts_total", "Consumer loop restarts"));
    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("frontend_commands_total", "Commands dispatched by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("frontend_command_duration_seconds", "Command handler latency by name")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("frontend_command_errors_total", "Command errors by name and kind"), &["command", "kind"]));
    register!(PUBLISHES, IntCounterVec::new(Opts::new("frontend_publishes_total", "Broker publishes by outcome"), &["outcome"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

#[inline]
fn inc(metric: &OnceLock<IntCounter>, by: u64) {
    if let Some(c) = metric.get() {
        c.inc_by(by);
    }
}

#[inline]
pub fn record_received(count: usize) {
    inc(&MESSAGES_RECEIVED, count as u64);
}

#[inline]
pub fn record_dropped() {
    inc(&MESSAGES_DROPPED, 1);
}

#[inline]
pub fn record_batch_deleted() {
    inc(&BATCHES_DELETED, 1);
}

#[inline]
pub fn record_envelope_rejected() {
    inc(&ENVELOPES_REJECTED, 1);
}

#[inline]
pub fn record_restart() {
    inc(&LOOP_RESTARTS, 1);
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, kind: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, kind]).inc();
    }
}

#[inline]
pub fn record_publish(ok: bool) {
    if let Some(c) = PUBLISHES.get() {
        c.with_label_values(&[if ok { "ok" } else { "error" }]).inc();
    }
}
