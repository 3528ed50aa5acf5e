//! Source tree walker
//!
//! Streams normalized entries from a [`SourceGroup`] to a single consumer
//! over a bounded channel. The traversal is depth-first pre-order: the
//! entries of a group are emitted before any of its child groups are
//! visited. Dropping the sender at the end of the walk is the
//! end-of-stream signal.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use kpvault_core::domain::entry::UniversalEntry;
use kpvault_core::domain::tree::SourceGroup;

/// Counters returned by a finished walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Entries normalized and handed to the consumer
    pub emitted: u64,
    /// Entries skipped because normalization failed
    pub failed: u64,
}

/// Number of entries a walk of `root` will emit
///
/// Entries that fail normalization are not counted, so the total matches
/// what the consumer can advance the progress counter by.
pub fn count_entries(root: &SourceGroup) -> u64 {
    let own = root
        .entries
        .iter()
        .filter(|source| UniversalEntry::from_source(Vec::new(), source).is_ok())
        .count() as u64;
    own + root.groups.iter().map(count_entries).sum::<u64>()
}

/// Spawns the walk of `root` as a background task
///
/// Returns the receiving end of the entry stream and a handle resolving
/// to the walk counters once the tree is exhausted.
pub fn spawn(
    root: SourceGroup,
    capacity: usize,
) -> (mpsc::Receiver<UniversalEntry>, JoinHandle<WalkStats>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(async move { walk(&root, tx).await });
    (rx, handle)
}

/// Walks `root` and sends every normalized entry on `tx`
///
/// The root group's own name is not part of any location. The walk stops
/// early if the receiver is dropped.
pub async fn walk(root: &SourceGroup, tx: mpsc::Sender<UniversalEntry>) -> WalkStats {
    let mut stats = WalkStats::default();
    walk_group(root, Vec::new(), &tx, &mut stats).await;
    debug!(
        emitted = stats.emitted,
        failed = stats.failed,
        "Source tree exhausted"
    );
    stats
}

/// Visits one group; returns `false` once the consumer has gone away
///
/// Each child recursion receives its own copy of `location` so sibling
/// branches never see each other's segments.
fn walk_group<'a>(
    group: &'a SourceGroup,
    location: Vec<String>,
    tx: &'a mpsc::Sender<UniversalEntry>,
    stats: &'a mut WalkStats,
) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
    Box::pin(async move {
        for source in &group.entries {
            match UniversalEntry::from_source(location.clone(), source) {
                Ok(entry) => {
                    if tx.send(entry).await.is_err() {
                        warn!("Entry consumer closed, stopping walk");
                        return false;
                    }
                    stats.emitted += 1;
                }
                Err(err) => {
                    warn!(error = %err, "Skipping entry that could not be normalized");
                    stats.failed += 1;
                }
            }
        }

        for child in &group.groups {
            let mut child_location = location.clone();
            child_location.push(child.name.clone());
            if !walk_group(child, child_location, tx, stats).await {
                return false;
            }
        }

        true
    })
}
