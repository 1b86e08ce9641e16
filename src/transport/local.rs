//! Local-mode transports.
//!
//! Used when the service runs outside a deployment: raw queue messages are
//! `*.json` files dropped into a spool directory, parameters come from the
//! config file, and publishes are written to the log.

use super::{
    Broker, DeleteEntry, DeleteOutcome, OutboundMessage, Parameter, ParameterPage,
    ParameterStore, QueueClient, RawQueueMessage, page_parameters,
};
use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

const SPOOL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Queue backed by a directory of message files.
///
/// Files are delivered in name order. The receipt handle is the file name,
/// so deleting a message removes its file.
pub struct SpoolQueue {
    dir: PathBuf,
}

impl SpoolQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the spool directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, TransportError> {
        let queue = Self::new(dir);
        tokio::fs::create_dir_all(&queue.dir).await?;
        Ok(queue)
    }

    async fn scan(&self, max: usize) -> Result<Vec<RawQueueMessage>, TransportError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                names.push(path);
            }
        }
        names.sort();

        // Unreadable files do not count against `max`.
        let mut batch = Vec::new();
        for path in names {
            if batch.len() >= max {
                break;
            }
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => batch.push(Self::message_for(&path, body)),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable spool file"),
            }
        }
        Ok(batch)
    }

    fn message_for(path: &Path, body: String) -> RawQueueMessage {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        RawQueueMessage {
            message_id: stem,
            receipt_handle: file_name,
            body,
        }
    }
}

#[async_trait]
impl QueueClient for SpoolQueue {
    async fn receive(
        &self,
        max: usize,
        wait: Duration,
    ) -> Result<Vec<RawQueueMessage>, TransportError> {
        let deadline = Instant::now() + wait;
        loop {
            let batch = self.scan(max).await?;
            if !batch.is_empty() || Instant::now() >= deadline {
                return Ok(batch);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(SPOOL_POLL_INTERVAL.min(remaining)).await;
        }
    }

    async fn delete_batch(&self, entries: &[DeleteEntry]) -> Result<DeleteOutcome, TransportError> {
        let mut outcome = DeleteOutcome::default();
        for entry in entries {
            // Receipt handles are bare file names; anything else is not ours.
            let handle = Path::new(&entry.receipt_handle);
            if handle.components().count() != 1 {
                outcome.failed.push(entry.id.clone());
                continue;
            }
            match tokio::fs::remove_file(self.dir.join(handle)).await {
                Ok(()) => outcome.successful.push(entry.id.clone()),
                Err(e) => {
                    warn!(id = %entry.id, error = %e, "Failed to remove spool file");
                    outcome.failed.push(entry.id.clone());
                }
            }
        }
        Ok(outcome)
    }
}

/// Parameter store serving the `[parameters.values]` table.
pub struct StaticParameterStore {
    parameters: Vec<Parameter>,
}

impl StaticParameterStore {
    pub fn new(values: &HashMap<String, String>) -> Self {
        let mut parameters: Vec<Parameter> = values
            .iter()
            .map(|(name, value)| Parameter {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        parameters.sort_by(|a, b| a.name.cmp(&b.name));
        Self { parameters }
    }
}

#[async_trait]
impl ParameterStore for StaticParameterStore {
    async fn get_parameters_by_path(
        &self,
        path: &str,
        page_size: usize,
        next_token: Option<String>,
    ) -> Result<ParameterPage, TransportError> {
        page_parameters(&self.parameters, path, page_size, next_token)
    }
}

/// Broker that logs each publish and accepts it.
pub struct LogBroker;

#[async_trait]
impl Broker for LogBroker {
    async fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        info!(
            topic = %message.topic,
            qos = message.qos,
            scoped = message.scoped,
            payload = %message.encode(),
            "Publish"
        );
        Ok(())
    }
}
