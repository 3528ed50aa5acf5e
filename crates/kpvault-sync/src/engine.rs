//! Reconciliation engine
//!
//! The [`Reconciler`] migrates a decoded source tree into the target
//! store and classifies every target key relative to the source.
//!
//! ## Run Flow
//!
//! 1. **Scan**: list the target mount into an [`ExistingPathSet`]
//! 2. **Stream**: spawn the tree walker and the progress reporter
//! 3. **Consume**: filter, classify and write each entry with retry
//! 4. **Finalize**: stop progress, count unseen keys, optionally delete them
//!
//! ## Retry Logic
//!
//! Each write gets [`MAX_WRITE_ATTEMPTS`] attempts, each bounded by its own
//! timeout. An entry that still fails is abandoned; the run goes on.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kpvault_core::config::Config;
use kpvault_core::domain::entry::{KvPayload, UniversalEntry};
use kpvault_core::domain::errors::DomainError;
use kpvault_core::domain::tree::SourceGroup;
use kpvault_core::ports::secret_store::ISecretStore;

use crate::existing::{ExistingPathSet, Lookup};
use crate::progress::{ProgressHandle, ProgressReporter};
use crate::scanner::Scanner;
use crate::walker;
use crate::SyncError;

// ============================================================================
// SyncOptions
// ============================================================================

/// Immutable settings for one reconciliation run
///
/// Built once from the loaded [`Config`] and passed to the engine; nothing
/// in this crate reads flags or environment on its own.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Mount the secrets live under, without a trailing separator
    pub mount: String,
    /// Only entries carrying this tag are migrated
    pub tag: Option<String>,
    /// Keys matching any of these are skipped
    pub exclude: Vec<Regex>,
    /// Delete keys that no longer exist in the source
    pub delete: bool,
    /// Bound on every list, put and delete call
    pub timeout: Duration,
    pub progress_interval: Duration,
    /// Pause after the first failed write attempt, doubled for each retry
    pub retry_delay: Duration,
    pub channel_capacity: usize,
}

impl SyncOptions {
    /// Builds run options from configuration, compiling exclusion patterns
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidPattern`] for the first pattern that
    /// does not compile.
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        let exclude = config
            .filters
            .exclude_paths
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|err| DomainError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            mount: config.vault.mount.trim_end_matches('/').to_string(),
            tag: config.filters.tag.clone().filter(|t| !t.is_empty()),
            exclude,
            delete: config.sync.delete,
            timeout: config.vault.timeout(),
            progress_interval: config.sync.progress_interval(),
            retry_delay: config.sync.retry_delay(),
            channel_capacity: config.sync.channel_capacity,
        })
    }

    /// Whether `key` matches any exclusion pattern
    pub fn is_excluded(&self, key: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(key))
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        // Default config has no patterns, so this cannot fail
        Self::from_config(&Config::default()).unwrap_or_else(|_| Self {
            mount: "password".to_string(),
            tag: None,
            exclude: Vec::new(),
            delete: false,
            timeout: Duration::from_secs(5),
            progress_interval: Duration::from_secs(2),
            retry_delay: Duration::ZERO,
            channel_capacity: 256,
        })
    }
}

// ============================================================================
// ReconcileSummary
// ============================================================================

/// Outcome of a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Existing keys matched by a source entry
    pub still_exist: u64,
    /// Existing keys no source entry matched
    pub no_longer_exist: u64,
    /// Source entries with no existing key
    pub new: u64,
    /// Source entries skipped by the tag or path filters
    pub filtered: u64,
    /// Successful writes
    pub written: u64,
    /// Entries abandoned after every write attempt failed
    pub write_failures: u64,
    /// Source entries that could not be normalized
    pub skipped: u64,
    /// Entries expected by the progress reporter
    pub total: u64,
    /// Final value of the progress counter
    pub processed: u64,
    /// Whether missing keys were deleted
    pub delete_enabled: bool,
    pub deleted: u64,
    pub delete_failures: u64,
    pub started_at: Option<DateTime<Utc>>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl ReconcileSummary {
    /// The one-line totals report
    pub fn totals_line(&self) -> String {
        let label = if self.delete_enabled {
            "deleted"
        } else {
            "no longer exist"
        };
        format!(
            "Totals: {} still exist, {} {}, {} new, {} filtered",
            self.still_exist, self.no_longer_exist, label, self.new, self.filtered
        )
    }
}

// ============================================================================
// Retry logic
// ============================================================================

/// Attempts allowed for each write
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Runs a store call under `timeout`, turning expiry into an error
async fn with_timeout<T, Fut>(
    operation: &'static str,
    target: &str,
    timeout: Duration,
    fut: Fut,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(SyncError::Timeout {
            operation,
            target: target.to_string(),
            timeout,
        }
        .into()),
    }
}

/// Executes an async operation up to `attempts` times
///
/// Failed attempts before the last are logged at debug level. The delay
/// between attempts starts at `base_delay` and doubles each time; a zero
/// delay retries immediately. The last error is returned to the caller.
async fn with_retry<F, Fut, T>(
    operation_name: &str,
    attempts: u32,
    base_delay: Duration,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt, "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if attempt < attempts => {
                let delay = base_delay * 2u32.pow(attempt - 1);
                debug!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %format!("{err:#}"),
                    "Attempt failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

// ============================================================================
// Reconciler
// ============================================================================

/// Source-to-store reconciliation engine
///
/// ## Dependencies
///
/// - `store`: Target secret store (list, put, delete)
/// - `options`: Filters, mount, timeouts and deletion mode for the run
pub struct Reconciler {
    store: Arc<dyn ISecretStore>,
    options: SyncOptions,
}

impl Reconciler {
    /// Creates a new `Reconciler` writing to `store`
    pub fn new(store: Arc<dyn ISecretStore>, options: SyncOptions) -> Self {
        Self { store, options }
    }

    /// Reconciles the store against the decoded `tree`
    ///
    /// # Errors
    /// Fails only when the existing-state scan fails or the walker task
    /// dies. Per-entry write and delete failures are counted instead.
    #[tracing::instrument(skip_all, fields(mount = %self.options.mount))]
    pub async fn run(&self, tree: SourceGroup) -> Result<ReconcileSummary, SyncError> {
        let started_at = Utc::now();
        let started = Instant::now();

        let mut existing = Scanner::new(self.store.clone(), self.options.timeout)
            .scan(&self.options.mount)
            .await?;

        let total = walker::count_entries(&tree);
        info!(
            entries = total,
            existing = existing.len(),
            "Starting reconciliation"
        );

        let (rx, walk) = walker::spawn(tree, self.options.channel_capacity);
        let reporter = ProgressReporter::start(
            total,
            self.options.progress_interval,
            CancellationToken::new(),
        );

        let progress = reporter.handle();
        let mut summary = self.consume(rx, &mut existing, &progress).await;
        reporter.stop().await;
        summary.total = total;
        summary.processed = progress.current();

        let stats = walk
            .await
            .map_err(|err| SyncError::WalkerFailed(err.to_string()))?;
        summary.skipped = stats.failed;

        self.finalize(&existing, &mut summary).await;

        summary.started_at = Some(started_at);
        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!("{}", summary.totals_line());
        Ok(summary)
    }

    /// Drains the entry stream until the walker closes it
    async fn consume(
        &self,
        mut rx: mpsc::Receiver<UniversalEntry>,
        existing: &mut ExistingPathSet,
        progress: &ProgressHandle,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary {
            delete_enabled: self.options.delete,
            ..ReconcileSummary::default()
        };

        while let Some(entry) = rx.recv().await {
            self.process(entry, existing, &mut summary).await;
            progress.increment();
        }

        summary
    }

    /// Filters, classifies and writes one entry
    async fn process(
        &self,
        entry: UniversalEntry,
        existing: &mut ExistingPathSet,
        summary: &mut ReconcileSummary,
    ) {
        if let Some(tag) = &self.options.tag {
            if !entry.has_tag(tag) {
                debug!(path = %entry.unescaped_path(), tag = %tag, "Filtered: missing required tag");
                summary.filtered += 1;
                return;
            }
        }

        let key = entry.key();
        if self.options.is_excluded(&key) {
            debug!(key = %key, "Filtered: excluded path");
            summary.filtered += 1;
            return;
        }

        let target = match existing.mark_seen(&key) {
            Lookup::Matched(target) => {
                debug!(key = %key, target = %target, "Secret still exists");
                target
            }
            Lookup::Duplicate(target) => {
                warn!(
                    key = %key,
                    target = %target,
                    id = %entry.id,
                    "Several source entries map to the same secret; last write wins"
                );
                target
            }
            Lookup::New => {
                debug!(key = %key, "New secret");
                summary.new += 1;
                key
            }
        };

        // A case-folded match writes under the existing casing
        let payload = entry.payload_for(&target);
        match self.write(&target, &payload).await {
            Ok(()) => summary.written += 1,
            Err(err) => {
                warn!(
                    key = %target,
                    attempts = MAX_WRITE_ATTEMPTS,
                    error = %format!("{err:#}"),
                    "Failed to write secret, skipping entry"
                );
                summary.write_failures += 1;
            }
        }
    }

    async fn write(&self, key: &str, payload: &KvPayload) -> Result<()> {
        let timeout = self.options.timeout;
        with_retry("put", MAX_WRITE_ATTEMPTS, self.options.retry_delay, || {
            with_timeout("put", key, timeout, self.store.put(key, payload))
        })
        .await
    }

    /// Counts unseen keys and deletes them when enabled
    async fn finalize(&self, existing: &ExistingPathSet, summary: &mut ReconcileSummary) {
        summary.still_exist = existing.seen().count() as u64;

        for key in existing.unseen() {
            summary.no_longer_exist += 1;
            if !self.options.delete {
                debug!(key, "Secret no longer exists in source");
                continue;
            }

            match with_timeout(
                "delete",
                key,
                self.options.timeout,
                self.store.delete(key),
            )
            .await
            {
                Ok(()) => {
                    info!(key, "Deleted secret missing from source");
                    summary.deleted += 1;
                }
                Err(err) => {
                    warn!(key, error = %format!("{err:#}"), "Failed to delete secret");
                    summary.delete_failures += 1;
                }
            }
        }
    }
}
