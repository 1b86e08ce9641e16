//! Transport capabilities.
//!
//! The queue, the parameter store and the pub/sub broker are external
//! collaborators. The service only talks to them through these traits;
//! concrete clients are supplied at startup.

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub mod local;
pub mod memory;

/// A message as delivered by the queue, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQueueMessage {
    pub message_id: String,
    /// Opaque delivery token required to delete the message.
    pub receipt_handle: String,
    pub body: String,
}

/// One entry of a batch delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEntry {
    pub id: String,
    pub receipt_handle: String,
}

impl From<&RawQueueMessage> for DeleteEntry {
    fn from(msg: &RawQueueMessage) -> Self {
        Self {
            id: msg.message_id.clone(),
            receipt_handle: msg.receipt_handle.clone(),
        }
    }
}

/// Result of a batch delete, split by entry id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub successful: Vec<String>,
    pub failed: Vec<String>,
}

/// Inbound queue with long-poll receive and batch delete.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Receive up to `max` messages, waiting at most `wait` for the first one.
    async fn receive(
        &self,
        max: usize,
        wait: Duration,
    ) -> Result<Vec<RawQueueMessage>, TransportError>;

    /// Delete every entry in one call.
    async fn delete_batch(&self, entries: &[DeleteEntry]) -> Result<DeleteOutcome, TransportError>;
}

/// A named parameter as stored under a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// One page of a by-path parameter listing.
#[derive(Debug, Clone, Default)]
pub struct ParameterPage {
    pub parameters: Vec<Parameter>,
    pub next_token: Option<String>,
}

/// Page through `parameters` under `path`, using the start offset as token.
pub(crate) fn page_parameters(
    parameters: &[Parameter],
    path: &str,
    page_size: usize,
    next_token: Option<String>,
) -> Result<ParameterPage, TransportError> {
    let start = match next_token {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| TransportError::Parameters(format!("invalid next token: {token}")))?,
        None => 0,
    };
    let matching: Vec<&Parameter> = parameters
        .iter()
        .filter(|p| p.name.starts_with(path))
        .collect();
    let end = (start + page_size.max(1)).min(matching.len());
    let page = matching
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .map(|p| (*p).clone())
        .collect();
    let next_token = (end < matching.len()).then(|| end.to_string());
    Ok(ParameterPage {
        parameters: page,
        next_token,
    })
}

/// Hierarchical key-value store read once at startup.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch one page of parameters under `path` (recursive, decrypted).
    async fn get_parameters_by_path(
        &self,
        path: &str,
        page_size: usize,
        next_token: Option<String>,
    ) -> Result<ParameterPage, TransportError>;
}

/// A message ready for the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: Value,
    pub qos: u8,
    /// Whether the payload was stamped with the requesting session.
    pub scoped: bool,
}

impl OutboundMessage {
    /// Serialized payload as handed to the wire.
    pub fn encode(&self) -> String {
        self.payload.to_string()
    }
}

/// Pub/sub broker. A successful return means "accepted for publish" only.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}
