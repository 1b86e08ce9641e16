//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Service Defaults
// =============================================================================

pub fn default_stage() -> String {
    "test".to_string()
}

// =============================================================================
// Queue Defaults
// =============================================================================

/// Upper bound of a single receive call on the queue service.
pub fn default_max_messages() -> usize {
    10
}

pub fn default_wait_time_secs() -> u64 {
    10
}

// =============================================================================
// Parameter Store Defaults
// =============================================================================

pub fn default_path_prefix() -> String {
    "/pgc".to_string()
}

pub fn default_page_size() -> usize {
    10
}

pub fn default_required_key() -> String {
    "SQS_FRONTEND".to_string()
}

// =============================================================================
// HTTP Defaults
// =============================================================================

pub fn default_http_port() -> u16 {
    3000
}

// =============================================================================
// Restart / Shutdown Defaults
// =============================================================================

pub fn default_base_delay_ms() -> u64 {
    500
}

pub fn default_max_delay_ms() -> u64 {
    30_000
}

pub fn default_stable_after_secs() -> u64 {
    60
}

pub fn default_grace_ms() -> u64 {
    500
}

// =============================================================================
// Local Mode Defaults
// =============================================================================

pub fn default_spool_dir() -> String {
    "spool".to_string()
}
