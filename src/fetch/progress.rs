//! Periodic batch progress reporting
//!
//! Workers bump the counters; a detached task logs a snapshot on a fixed
//! cadence until the batch drains or the run is cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shared done/failed/running counters for one fetch batch.
#[derive(Debug)]
pub struct ProgressCounters {
    total: usize,
    done: AtomicUsize,
    failed: AtomicUsize,
    running: AtomicUsize,
}

impl ProgressCounters {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
        }
    }

    pub fn site_started(&self) {
        self.running.fetch_add(1, Ordering::Relaxed);
    }

    pub fn site_done(&self, success: bool) {
        self.running.fetch_sub(1, Ordering::Relaxed);
        if success {
            self.done.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// `(done, failed, running, queued)` snapshot.
    pub fn snapshot(&self) -> (usize, usize, usize, usize) {
        let done = self.done.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let running = self.running.load(Ordering::Relaxed);
        let queued = self.total.saturating_sub(done + failed + running);
        (done, failed, running, queued)
    }

    pub fn finished(&self) -> bool {
        let (done, failed, ..) = self.snapshot();
        done + failed >= self.total
    }
}

/// Spawn the reporter task. It stops on its own once the batch drains.
pub fn spawn_reporter(
    counters: Arc<ProgressCounters>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so the first report
        // lands a full interval into the batch.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let (done, failed, running, queued) = counters.snapshot();
                    info!(done, failed, running, queued, "fetch progress");
                    if counters.finished() {
                        break;
                    }
                }
            }
        }
    })
}
