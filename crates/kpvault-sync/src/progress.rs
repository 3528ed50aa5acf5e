//! Progress reporter
//!
//! A background task that periodically logs how many entries have been
//! processed out of the expected total. The producer side only touches an
//! atomic counter through [`ProgressHandle`], so reads by the reporter
//! never race with updates.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cloneable handle to the shared progress counter
#[derive(Debug, Clone, Default)]
pub struct ProgressHandle {
    current: Arc<AtomicI64>,
}

impl ProgressHandle {
    /// Adjusts the counter by a signed delta
    pub fn adjust(&self, delta: i64) {
        self.current.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn increment(&self) {
        self.adjust(1);
    }

    /// Current value, never below zero
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed).max(0) as u64
    }
}

/// Percentage of `current` over `total`; an empty run counts as complete
pub fn percent(current: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    current as f64 * 100.0 / total as f64
}

/// Running progress task
pub struct ProgressReporter {
    handle: ProgressHandle,
    reports: Arc<AtomicU64>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressReporter {
    /// Starts logging `current/total (pct%)` every `interval`
    ///
    /// The first line is emitted one full interval after start. The task
    /// ends as soon as `token` is cancelled.
    pub fn start(total: u64, interval: Duration, token: CancellationToken) -> Self {
        let handle = ProgressHandle::default();
        let reports = Arc::new(AtomicU64::new(0));

        let task = {
            let handle = handle.clone();
            let reports = reports.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // The first tick completes immediately
                ticker.tick().await;

                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            let current = handle.current();
                            info!(
                                current,
                                total,
                                "Progress: {}/{} ({:.2}%)",
                                current,
                                total,
                                percent(current, total)
                            );
                            reports.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        };

        Self {
            handle,
            reports,
            token,
            task,
        }
    }

    /// Handle for the producer side
    pub fn handle(&self) -> ProgressHandle {
        self.handle.clone()
    }

    /// Number of progress lines emitted so far
    pub fn reports(&self) -> u64 {
        self.reports.load(Ordering::Relaxed)
    }

    /// Cancels the reporter and waits for the task to finish
    pub async fn stop(self) -> u64 {
        self.token.cancel();
        let _ = self.task.await;
        self.reports.load(Ordering::Relaxed)
    }
}
