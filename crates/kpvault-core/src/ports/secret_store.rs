//! Secret store port (driven/secondary port)
//!
//! This module defines the interface for the flat key-value store that
//! receives migrated credentials. The primary implementation targets the
//! HashiCorp Vault KV v1 engine.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific.
//! - Timeouts are applied by the caller around each call; implementations
//!   must be cancel-safe when their future is dropped.

use crate::domain::entry::KvPayload;

/// Port trait for flat key-value secret stores
#[async_trait::async_trait]
pub trait ISecretStore: Send + Sync {
    /// Lists the immediate children of `path`
    ///
    /// `path` is a logical path that includes the mount (e.g. `password/Work`).
    /// Child names ending in `/` denote sub-namespaces; all others are secrets.
    /// An empty or missing namespace returns an empty list.
    async fn list(&self, path: &str) -> anyhow::Result<Vec<String>>;

    /// Writes `payload` under `key`, relative to the mount
    async fn put(&self, key: &str, payload: &KvPayload) -> anyhow::Result<()>;

    /// Deletes the secret at `key`, relative to the mount
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}
