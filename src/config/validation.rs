//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("service.stage is required")]
    MissingStage,
    #[error("queue.max_messages must be between 1 and 10, got {0}")]
    InvalidMaxMessages(usize),
    #[error("queue.wait_time_secs must be at most 20, got {0}")]
    InvalidWaitTime(u64),
    #[error("parameters.required_key is required")]
    MissingRequiredKey,
    #[error("parameters.page_size must be at least 1")]
    InvalidPageSize,
    #[error("restart.base_delay_ms ({0}) exceeds restart.max_delay_ms ({1})")]
    InvalidRestartDelays(u64, u64),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.stage.is_empty() {
        errors.push(ValidationError::MissingStage);
    }

    // Receive calls cap out at 10 messages and a 20 second long poll.
    if !(1..=10).contains(&config.queue.max_messages) {
        errors.push(ValidationError::InvalidMaxMessages(config.queue.max_messages));
    }
    if config.queue.wait_time_secs > 20 {
        errors.push(ValidationError::InvalidWaitTime(config.queue.wait_time_secs));
    }

    if config.parameters.required_key.is_empty() {
        errors.push(ValidationError::MissingRequiredKey);
    }
    if config.parameters.page_size == 0 {
        errors.push(ValidationError::InvalidPageSize);
    }

    let restart = &config.restart;
    if restart.base_delay_ms > restart.max_delay_ms {
        errors.push(ValidationError::InvalidRestartDelays(
            restart.base_delay_ms,
            restart.max_delay_ms,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
