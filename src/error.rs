//! Unified error handling for frontend-manager.
//!
//! One error enum per concern, with static codes for metric labeling where
//! the error ends up counted.

use thiserror::Error;

// ============================================================================
// Transport Errors (queue, parameter store, broker)
// ============================================================================

/// Errors raised by a transport capability.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("queue error: {0}")]
    Queue(String),

    #[error("parameter store error: {0}")]
    Parameters(String),

    #[error("publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors a command handler can raise after validation passed.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("command payload missing from envelope: {0}")]
    MissingCommand(String),

    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("{0} payload is not an object")]
    NotAnObject(String),

    #[error("malformed command payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("publish failed: {0}")]
    Publish(#[from] TransportError),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCommand(_) => "missing_command",
            Self::MissingField(_) => "missing_field",
            Self::NotAnObject(_) => "not_an_object",
            Self::Decode(_) => "decode",
            Self::Publish(_) => "publish",
            Self::Panicked(_) => "panic",
        }
    }
}

/// Result type for command handlers.
///
/// `Ok(true)` means the outbound message was accepted for publish,
/// `Ok(false)` means the handler declined (a precondition failed).
pub type HandlerResult = Result<bool, HandlerError>;

// ============================================================================
// Consumer Errors (poll/ack cycle)
// ============================================================================

/// Errors that escape a poll cycle and end the consumer loop.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("receive failed: {0}")]
    Receive(#[source] TransportError),

    #[error("batch delete failed: {0}")]
    Delete(#[source] TransportError),
}

// ============================================================================
// Parameter Errors (startup)
// ============================================================================

/// Errors from the startup parameter fetch.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("parameters not retrieved from {0}")]
    Empty(String),

    #[error("required parameter {0} not retrieved")]
    MissingRequired(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
