//! kpvault Sync - Reconciliation engine
//!
//! Provides:
//! - Depth-first streaming of a source tree as normalized entries
//! - Breadth-first scanning of the target namespace
//! - Classification of every key as new, still existing, or gone
//! - Retried writes, optional deletion and periodic progress logging
//!
//! ## Modules
//!
//! - [`walker`] - Source tree producer feeding the engine over a channel
//! - [`scanner`] - Existing-state listing of the target store
//! - [`existing`] - The existing-path set and its seen flags
//! - [`engine`] - Consumer loop, filters, retries and final totals
//! - [`progress`] - Background progress reporter

pub mod engine;
pub mod existing;
pub mod progress;
pub mod scanner;
pub mod walker;

use std::time::Duration;

use thiserror::Error;

pub use engine::{ReconcileSummary, Reconciler, SyncOptions};

/// Errors that abort a reconciliation run
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing a namespace of the target store failed
    #[error("Failed to list {path}: {source:#}")]
    ListFailed {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// A store call did not finish within the configured timeout
    #[error("{operation} of {target} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        target: String,
        timeout: Duration,
    },

    /// The tree walker task did not complete
    #[error("Tree walker failed: {0}")]
    WalkerFailed(String),

    /// A domain-level error propagated from kpvault-core
    #[error("Domain error: {0}")]
    DomainError(#[from] kpvault_core::domain::errors::DomainError),
}
