//! Wired service on in-process transports.

#![allow(dead_code)]

use frontend_manager::config::RestartConfig;
use frontend_manager::consumer::Consumer;
use frontend_manager::handlers::Registry;
use frontend_manager::processor::Processor;
use frontend_manager::publisher::Publisher;
use frontend_manager::supervisor::Supervisor;
use frontend_manager::transport::memory::{Journal, MemoryQueue, RecordingBroker};
use std::sync::Arc;
use std::time::Duration;

pub const STAGE: &str = "test";

/// Queue, broker and processing pipeline sharing one journal.
pub struct TestService {
    pub journal: Journal,
    pub queue: Arc<MemoryQueue>,
    pub broker: Arc<RecordingBroker>,
    pub processor: Arc<Processor>,
    pub consumer: Arc<Consumer>,
}

impl TestService {
    pub fn new() -> Self {
        Self::with_broker(RecordingBroker::new())
    }

    /// Every publish is held for `delay` before being accepted.
    pub fn with_publish_delay(delay: Duration) -> Self {
        Self::with_broker(RecordingBroker::new().with_delay(delay))
    }

    fn with_broker(broker: RecordingBroker) -> Self {
        let journal = Journal::new();
        let broker = Arc::new(broker.with_journal(journal.clone()));
        let queue = Arc::new(MemoryQueue::with_journal(journal.clone()));
        let publisher = Arc::new(Publisher::new(STAGE, broker.clone()));
        let processor = Arc::new(Processor::new(Arc::new(Registry::new()), publisher));
        let consumer = Arc::new(Consumer::new(
            queue.clone(),
            processor.clone(),
            10,
            Duration::from_millis(20),
        ));
        Self {
            journal,
            queue,
            broker,
            processor,
            consumer,
        }
    }

    /// Supervisor with millisecond restart delays.
    pub fn supervisor(&self) -> Supervisor {
        Supervisor::new(
            self.consumer.clone(),
            RestartConfig {
                base_delay_ms: 1,
                max_delay_ms: 5,
                stable_after_secs: 60,
            },
        )
    }

    /// Topic for a category under the test stage.
    pub fn topic(category: &str) -> String {
        format!("{STAGE}/{category}")
    }
}
