//! VaultKvStore - ISecretStore implementation for Vault KV v1
//!
//! Wraps the [`VaultClient`] to fulfil the [`ISecretStore`] port contract.
//!
//! ## Design Notes
//!
//! - `list` takes the full logical path (mount included), because the
//!   scanner walks the namespace starting at the mount itself.
//! - `put` and `delete` take keys relative to the mount, as produced by
//!   the path codec.

use anyhow::{Context, Result};

use kpvault_core::domain::entry::KvPayload;
use kpvault_core::ports::secret_store::ISecretStore;

use crate::client::VaultClient;

/// Secret store backed by one KV v1 mount
#[derive(Debug)]
pub struct VaultKvStore {
    client: VaultClient,
    mount: String,
}

impl VaultKvStore {
    /// Creates a store writing below `mount`
    pub fn new(client: VaultClient, mount: impl Into<String>) -> Self {
        let mount = mount.into().trim_matches('/').to_string();
        Self { client, mount }
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Full logical path of a mount-relative key
    fn secret_path(&self, key: &str) -> String {
        format!("{}/{}", self.mount, key.trim_start_matches('/'))
    }
}

#[async_trait::async_trait]
impl ISecretStore for VaultKvStore {
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        self.client
            .list(path)
            .await
            .with_context(|| format!("Failed to list {path}"))
    }

    async fn put(&self, key: &str, payload: &KvPayload) -> Result<()> {
        let path = self.secret_path(key);
        self.client
            .write(&path, payload)
            .await
            .with_context(|| format!("Failed to write {path}"))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.secret_path(key);
        self.client
            .delete(&path)
            .await
            .with_context(|| format!("Failed to delete {path}"))
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn store(mount: &str) -> VaultKvStore {
        let client = VaultClient::new(
            "http://127.0.0.1:8200",
            SecretString::from("t".to_string()),
        )
        .unwrap();
        VaultKvStore::new(client, mount)
    }

    #[test]
    fn test_mount_is_trimmed() {
        assert_eq!(store("/password/").mount(), "password");
    }

    #[test]
    fn test_secret_path_joins_mount_and_key() {
        let store = store("secret/team");
        assert_eq!(store.secret_path("Work/VPN"), "secret/team/Work/VPN");
        assert_eq!(store.secret_path("/Router"), "secret/team/Router");
    }
}
