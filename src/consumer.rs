//! Queue consumption and batch acknowledgment.
//!
//! One cycle: receive a batch, fan the envelopes out as independent tasks,
//! wait for every task to settle, then delete the whole batch in one call.
//! Messages that cannot be parsed are deleted along with the rest.

use crate::error::ConsumerError;
use crate::processor::Processor;
use crate::telemetry::spans;
use crate::transport::{DeleteEntry, QueueClient, RawQueueMessage};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info};

/// What one poll cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub received: usize,
    /// Envelopes handed to the processor.
    pub processed: usize,
    /// Messages dropped before processing (bad JSON, no `msg`).
    pub dropped: usize,
    /// Processing tasks that ended abnormally.
    pub crashed: usize,
    /// Entries the queue confirmed as deleted.
    pub deleted: usize,
    /// Entries the queue refused to delete.
    pub delete_failed: usize,
}

/// Pulls batches off the inbound queue and acknowledges them.
pub struct Consumer {
    queue: Arc<dyn QueueClient>,
    processor: Arc<Processor>,
    max_messages: usize,
    wait: Duration,
}

impl Consumer {
    pub fn new(
        queue: Arc<dyn QueueClient>,
        processor: Arc<Processor>,
        max_messages: usize,
        wait: Duration,
    ) -> Self {
        Self {
            queue,
            processor,
            max_messages,
            wait,
        }
    }

    /// Run cycles until one fails.
    pub async fn run(&self) -> Result<(), ConsumerError> {
        loop {
            self.poll_once().await?;
        }
    }

    /// One receive / process / delete cycle.
    pub async fn poll_once(&self) -> Result<BatchReport, ConsumerError> {
        info!("Getting messages...");
        let messages = self
            .queue
            .receive(self.max_messages, self.wait)
            .await
            .map_err(ConsumerError::Receive)?;

        if messages.is_empty() {
            info!("No messages");
            return Ok(BatchReport::default());
        }

        let count = messages.len();
        info!(count, "Got {count} message(s)");
        crate::metrics::record_received(count);

        self.settle(messages).instrument(spans::batch(count)).await
    }

    async fn settle(&self, messages: Vec<RawQueueMessage>) -> Result<BatchReport, ConsumerError> {
        let mut report = BatchReport {
            received: messages.len(),
            ..BatchReport::default()
        };
        let entries: Vec<DeleteEntry> = messages.iter().map(DeleteEntry::from).collect();

        let mut tasks = JoinSet::new();
        for message in messages {
            let Some(envelope) = extract_envelope(&message.body) else {
                error!(message_id = %message.message_id, "Message not JSON: {}", message.body);
                crate::metrics::record_dropped();
                report.dropped += 1;
                continue;
            };
            info!(message_id = %message.message_id, "Message: {envelope}");

            let processor = Arc::clone(&self.processor);
            tasks.spawn(async move { processor.process(envelope).await });
            report.processed += 1;
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Envelope task ended abnormally");
                report.crashed += 1;
            }
        }

        let outcome = self
            .queue
            .delete_batch(&entries)
            .await
            .map_err(ConsumerError::Delete)?;
        report.deleted = outcome.successful.len();
        report.delete_failed = outcome.failed.len();
        crate::metrics::record_batch_deleted();
        info!(
            successful = report.deleted,
            failed = report.delete_failed,
            "Deleted messages :: successful: {} failed: {}",
            report.deleted,
            report.delete_failed
        );
        Ok(report)
    }
}

/// The envelope carried in a raw body's `msg` field.
fn extract_envelope(body: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut map)) => map.remove("msg"),
        _ => None,
    }
}
