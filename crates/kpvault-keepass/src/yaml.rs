//! YAML tree source
//!
//! Reads a plaintext export of the group tree:
//!
//! ```yaml
//! name: Root
//! entries:
//!   - uuid: 6f1c1b4e-7b0e-4d59-9a51-1b0b6f0c2a11
//!     tags: "prod,mail"
//!     fields:
//!       Title: Gmail
//!       UserName: alice
//!       Password: s3cret
//! groups:
//!   - name: Work
//!     entries: []
//! ```
//!
//! The passphrase is ignored.

use std::path::Path;

use anyhow::Result;
use secrecy::SecretString;
use tracing::debug;

use kpvault_core::domain::tree::SourceGroup;
use kpvault_core::ports::credential_source::ICredentialSource;

use crate::SourceError;

/// Credential source for YAML exports
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlTreeSource;

impl YamlTreeSource {
    /// Parses a YAML document into a group tree
    pub fn parse(path: &Path, content: &str) -> Result<SourceGroup, SourceError> {
        serde_yaml::from_str(content).map_err(|source| SourceError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ICredentialSource for YamlTreeSource {
    fn open(&self, path: &Path, _passphrase: &SecretString) -> Result<SourceGroup> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root = Self::parse(path, &content)?;
        debug!(
            path = %path.display(),
            entries = root.entry_count(),
            "Loaded YAML tree"
        );
        Ok(root)
    }
}
