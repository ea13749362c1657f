//! Debounced batch scheduling.
//!
//! Imaging devices write a burst of files in quick succession; a batch
//! should fire once per burst, N seconds after the last arrival. The
//! scheduler owns a single armed timer and a lock serializing every
//! arm/cancel transition, so at most one timer is live and at most one
//! batch is ever in flight.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// Whatever a fired timer executes. In production this is the intake
/// [`Pipeline`](crate::Pipeline); tests substitute a counter.
#[async_trait]
pub trait BatchRunner: Send + Sync {
    async fn run(&self);
}

struct Armed {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Coalesces bursts of filesystem events into one deferred batch run.
pub struct DebounceScheduler {
    delay: Duration,
    runner: Arc<dyn BatchRunner>,
    armed: Mutex<Option<Armed>>,
}

impl DebounceScheduler {
    pub fn new(runner: Arc<dyn BatchRunner>, delay: Duration) -> Self {
        Self { delay, runner, armed: Mutex::new(None) }
    }

    /// (Re)start the countdown: cancel any armed timer, then schedule a
    /// batch for `delay` from now.
    ///
    /// If the previous timer already fired, cancellation is a no-op and
    /// awaiting its task waits for the running batch to finish first; a
    /// batch in flight is never preempted, only the next one is delayed.
    pub async fn arm(&self) {
        let mut slot = self.armed.lock().await;
        if let Some(armed) = slot.take() {
            let _ = armed.cancel.send(());
            let _ = armed.handle.await;
        }
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let runner = Arc::clone(&self.runner);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = sleep(delay) => runner.run().await,
                _ = cancel_rx => {},
            }
        });
        *slot = Some(Armed { cancel: cancel_tx, handle });
        debug!(delay_seconds = self.delay.as_secs(), "batch countdown armed");
    }

    /// Cancel any pending timer and wait out a batch in flight.
    pub async fn shutdown(&self) {
        let mut slot = self.armed.lock().await;
        if let Some(armed) = slot.take() {
            let _ = armed.cancel.send(());
            let _ = armed.handle.await;
        }
    }
}
