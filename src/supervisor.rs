//! Consumer loop supervision.
//!
//! The consumer runs in its own task. Whenever it ends, with an error or a
//! panic, it is restarted after an exponentially growing, jittered delay.
//! A run that stayed up long enough resets the delay to its base.

use crate::config::RestartConfig;
use crate::consumer::Consumer;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Capped exponential delay sequence.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// Delay before the next restart, before jitter: `base * 2^attempt`, capped.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Spread `delay` over `[delay / 2, delay]`.
pub fn jittered(delay: Duration) -> Duration {
    let half = delay / 2;
    let spread = half.as_millis() as u64;
    if spread == 0 {
        return delay;
    }
    half + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
}

/// Keeps the consumer loop alive.
pub struct Supervisor {
    consumer: Arc<Consumer>,
    policy: RestartConfig,
    restarts: AtomicU64,
}

impl Supervisor {
    pub fn new(consumer: Arc<Consumer>, policy: RestartConfig) -> Self {
        Self {
            consumer,
            policy,
            restarts: AtomicU64::new(0),
        }
    }

    /// Number of restarts performed so far.
    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }

    /// Run the consumer forever, restarting it whenever it stops.
    pub async fn run(&self) {
        let mut backoff = Backoff::new(
            Duration::from_millis(self.policy.base_delay_ms),
            Duration::from_millis(self.policy.max_delay_ms),
        );
        let stable_after = Duration::from_secs(self.policy.stable_after_secs);

        loop {
            let started = Instant::now();
            let consumer = Arc::clone(&self.consumer);
            let handle = tokio::spawn(async move { consumer.run().await });

            match handle.await {
                Ok(Err(e)) => error!(error = %e, "Consumer loop failed"),
                Ok(Ok(())) => warn!("Consumer loop exited"),
                Err(e) if e.is_panic() => error!(error = %e, "Consumer loop panicked"),
                Err(e) => error!(error = %e, "Consumer loop cancelled"),
            }

            if started.elapsed() >= stable_after {
                backoff.reset();
            }
            let delay = jittered(backoff.next_delay());
            let restarts = self.restarts.fetch_add(1, Ordering::Relaxed) + 1;
            crate::metrics::record_restart();
            info!(
                restarts,
                attempt = backoff.attempt(),
                delay_ms = delay.as_millis() as u64,
                "Restarting consumer loop"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
