//! Credential source port (driven/secondary port)
//!
//! A credential source opens a hierarchical password database and hands
//! back its decoded group tree. Decryption and container parsing stay
//! inside the adapter.

use std::path::Path;

use secrecy::SecretString;

use crate::domain::tree::SourceGroup;

/// Port trait for hierarchical credential databases
pub trait ICredentialSource: Send + Sync {
    /// Opens the database at `path` and returns its root group
    ///
    /// The returned group is the database's top-level group; its own name
    /// is not part of any entry location.
    fn open(&self, path: &Path, passphrase: &SecretString) -> anyhow::Result<SourceGroup>;
}
