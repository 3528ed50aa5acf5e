//! Existing-state scanner
//!
//! Lists the whole key namespace under a mount breadth-first and returns
//! the keys with the mount prefix removed, so they compare directly with
//! keys built by the path codec. Any listing error fails the scan: an
//! incomplete snapshot would make later deletion decisions wrong.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use kpvault_core::domain::path::{strip_mount, SEPARATOR};
use kpvault_core::ports::secret_store::ISecretStore;

use crate::existing::ExistingPathSet;
use crate::SyncError;

/// Breadth-first lister of the target store
pub struct Scanner {
    store: Arc<dyn ISecretStore>,
    timeout: Duration,
}

impl Scanner {
    /// Creates a scanner bounding every list call by `timeout`
    pub fn new(store: Arc<dyn ISecretStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Scans every key below `mount`
    ///
    /// # Errors
    /// Returns [`SyncError::ListFailed`] or [`SyncError::Timeout`] for the
    /// first folder that cannot be listed.
    #[tracing::instrument(skip(self))]
    pub async fn scan(&self, mount: &str) -> Result<ExistingPathSet, SyncError> {
        let root = mount.trim_end_matches(SEPARATOR).to_string();
        let mut existing = ExistingPathSet::new();
        let mut folders = VecDeque::from([root.clone()]);
        let mut listed = 0u64;

        while let Some(folder) = folders.pop_front() {
            let children = self.list(&folder).await?;
            listed += 1;

            for child in children {
                match child.strip_suffix(SEPARATOR) {
                    Some(sub) => folders.push_back(format!("{folder}/{sub}")),
                    None => {
                        let full = format!("{folder}/{child}");
                        existing.insert(strip_mount(&full, &root));
                    }
                }
            }
        }

        info!(
            mount = %root,
            folders = listed,
            keys = existing.len(),
            "Scanned existing secrets"
        );
        Ok(existing)
    }

    async fn list(&self, folder: &str) -> Result<Vec<String>, SyncError> {
        debug!(folder, "Listing folder");
        match tokio::time::timeout(self.timeout, self.store.list(folder)).await {
            Ok(Ok(children)) => Ok(children),
            Ok(Err(source)) => Err(SyncError::ListFailed {
                path: folder.to_string(),
                source,
            }),
            Err(_) => Err(SyncError::Timeout {
                operation: "list",
                target: folder.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}
