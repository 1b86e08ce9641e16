//! In-process transports.
//!
//! Scripted queue, recording broker and paged parameter store. They share an
//! optional [`Journal`] so ordering across transports can be asserted on.

use super::{
    Broker, DeleteEntry, DeleteOutcome, OutboundMessage, Parameter, ParameterPage,
    ParameterStore, QueueClient, RawQueueMessage, page_parameters,
};
use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Build a raw message whose receipt handle is derived from its id.
pub fn raw_message(id: &str, body: impl Into<String>) -> RawQueueMessage {
    RawQueueMessage {
        message_id: id.to_string(),
        receipt_handle: format!("rh-{id}"),
        body: body.into(),
    }
}

/// Transport event, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEvent {
    Received(usize),
    Published(String),
    Deleted(Vec<String>),
}

/// Shared, append-only event log.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<JournalEvent>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: JournalEvent) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<JournalEvent> {
        self.0.lock().clone()
    }
}

// ============================================================================
// Queue
// ============================================================================

/// Queue that replays scripted receive results, then sits idle.
#[derive(Default)]
pub struct MemoryQueue {
    script: Mutex<VecDeque<Result<Vec<RawQueueMessage>, String>>>,
    deletes: Mutex<Vec<Vec<DeleteEntry>>>,
    fail_deletes: Mutex<bool>,
    journal: Option<Journal>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    /// Queue up the result of the next receive call.
    pub fn push_batch(&self, batch: Vec<RawQueueMessage>) {
        self.script.lock().push_back(Ok(batch));
    }

    /// Make the next receive call fail.
    pub fn push_failure(&self, reason: &str) {
        self.script.lock().push_back(Err(reason.to_string()));
    }

    /// Make every subsequent delete call fail.
    pub fn fail_deletes(&self) {
        *self.fail_deletes.lock() = true;
    }

    /// Every delete call seen so far.
    pub fn deletes(&self) -> Vec<Vec<DeleteEntry>> {
        self.deletes.lock().clone()
    }

    /// Scripted receive results not yet consumed.
    pub fn pending(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl QueueClient for MemoryQueue {
    async fn receive(
        &self,
        max: usize,
        wait: Duration,
    ) -> Result<Vec<RawQueueMessage>, TransportError> {
        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(mut batch)) => {
                batch.truncate(max);
                if let Some(journal) = &self.journal {
                    journal.record(JournalEvent::Received(batch.len()));
                }
                Ok(batch)
            }
            Some(Err(reason)) => Err(TransportError::Queue(reason)),
            None => {
                // Long poll with nothing to deliver.
                tokio::time::sleep(wait).await;
                Ok(Vec::new())
            }
        }
    }

    async fn delete_batch(&self, entries: &[DeleteEntry]) -> Result<DeleteOutcome, TransportError> {
        if *self.fail_deletes.lock() {
            return Err(TransportError::Queue("delete rejected".to_string()));
        }
        self.deletes.lock().push(entries.to_vec());
        if let Some(journal) = &self.journal {
            journal.record(JournalEvent::Deleted(
                entries.iter().map(|e| e.id.clone()).collect(),
            ));
        }
        Ok(DeleteOutcome {
            successful: entries.iter().map(|e| e.id.clone()).collect(),
            failed: Vec::new(),
        })
    }
}

// ============================================================================
// Broker
// ============================================================================

/// Broker that records everything it accepts.
#[derive(Default)]
pub struct RecordingBroker {
    published: Mutex<Vec<OutboundMessage>>,
    failing_topics: Mutex<HashSet<String>>,
    delay: Option<Duration>,
    journal: Option<Journal>,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every publish for `delay` before accepting it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Reject every publish on `topic`.
    pub fn fail_topic(&self, topic: &str) {
        self.failing_topics.lock().insert(topic.to_string());
    }

    pub fn published(&self) -> Vec<OutboundMessage> {
        self.published.lock().clone()
    }

    pub fn published_on(&self, topic: &str) -> Vec<OutboundMessage> {
        self.published
            .lock()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Broker for RecordingBroker {
    async fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_topics.lock().contains(&message.topic) {
            return Err(TransportError::Publish {
                topic: message.topic.clone(),
                reason: "broker rejected message".to_string(),
            });
        }
        self.published.lock().push(message.clone());
        if let Some(journal) = &self.journal {
            journal.record(JournalEvent::Published(message.topic.clone()));
        }
        Ok(())
    }
}

// ============================================================================
// Parameter Store
// ============================================================================

/// Parameter store over a fixed list, paged by position.
#[derive(Default)]
pub struct MemoryParameterStore {
    parameters: Vec<Parameter>,
    calls: Mutex<usize>,
}

impl MemoryParameterStore {
    pub fn new<I, K, V>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            parameters: parameters
                .into_iter()
                .map(|(name, value)| Parameter {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
            calls: Mutex::new(0),
        }
    }

    /// Number of page requests served.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn get_parameters_by_path(
        &self,
        path: &str,
        page_size: usize,
        next_token: Option<String>,
    ) -> Result<ParameterPage, TransportError> {
        *self.calls.lock() += 1;
        page_parameters(&self.parameters, path, page_size, next_token)
    }
}
