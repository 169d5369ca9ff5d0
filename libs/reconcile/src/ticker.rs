//! Cancellable periodic execution.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

/// One unit of periodic work.
#[async_trait]
pub trait PeriodicTask: Send {
    /// Name used in log fields.
    fn name(&self) -> &'static str;

    /// Perform one pass. Failures are the task's own to log.
    async fn tick(&mut self);
}

/// Drives a [`PeriodicTask`]: tick, then wait for the interval or shutdown.
pub struct Ticker {
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Ticker {
    pub fn new(interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self { interval, shutdown }
    }

    /// Run until shutdown is signalled. Returns the number of ticks performed.
    ///
    /// There is no final tick after the signal is observed.
    pub async fn run<T: PeriodicTask + ?Sized>(mut self, task: &mut T) -> u64 {
        info!(
            task = task.name(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting periodic task"
        );

        let mut ticks = 0u64;
        loop {
            if *self.shutdown.borrow() {
                break;
            }

            task.tick().await;
            ticks += 1;
            debug!(task = task.name(), ticks, "Tick complete");

            if !sleep_or_shutdown(self.interval, &mut self.shutdown).await {
                break;
            }
        }

        info!(task = task.name(), ticks, "Periodic task shutting down");
        ticks
    }
}

/// Resolve once the shutdown flag is `true`.
///
/// If the sender is dropped without raising the flag, no shutdown can
/// arrive any more and this never resolves.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            if *shutdown.borrow() {
                return;
            }
            std::future::pending::<()>().await;
        }
    }
}

/// Sleep for `duration` unless shutdown comes first.
///
/// Returns `true` if the full duration elapsed, `false` on shutdown.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = wait_for_shutdown(shutdown) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
