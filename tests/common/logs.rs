//! Log capture for asserting on operator-visible errors.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts ERROR events emitted by the crate.
#[derive(Clone, Default)]
pub struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() == Level::ERROR && metadata.target().starts_with("frontend_manager") {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Install a counting subscriber for the current thread.
///
/// `#[tokio::test]` runs on a current-thread runtime, so tasks spawned by the
/// code under test are counted too. Keep the guard alive for the assertion.
pub fn capture_errors() -> (DefaultGuard, ErrorCounter) {
    let counter = ErrorCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    (tracing::subscriber::set_default(subscriber), counter)
}
