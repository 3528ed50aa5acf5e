//! kpvault KeePass - Credential source adapters
//!
//! Provides:
//! - [`kdbx::KdbxSource`] - KeePass KDBX databases decoded with the `keepass` crate
//! - [`yaml::YamlTreeSource`] - Plain YAML exports of the same group tree
//!
//! Both implement `ICredentialSource` and hand the core a decoded
//! `SourceGroup`; the core never sees container bytes.

pub mod kdbx;
pub mod yaml;

use std::path::{Path, PathBuf};

use thiserror::Error;

use kpvault_core::ports::credential_source::ICredentialSource;

/// Errors that can occur while opening a credential source
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The KDBX container could not be decrypted or parsed
    #[error("Failed to open KeePass database {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// The YAML export is malformed
    #[error("Invalid YAML tree in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Source format, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Kdbx,
    Yaml,
}

impl SourceFormat {
    /// `.yaml` and `.yml` files are YAML exports; anything else is KDBX
    pub fn detect(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => SourceFormat::Yaml,
            _ => SourceFormat::Kdbx,
        }
    }

    /// Whether this format is encrypted and needs a passphrase
    pub fn needs_passphrase(self) -> bool {
        matches!(self, SourceFormat::Kdbx)
    }
}

/// Returns the source adapter for `path`
pub fn source_for(path: &Path) -> Box<dyn ICredentialSource> {
    match SourceFormat::detect(path) {
        SourceFormat::Kdbx => Box::new(kdbx::KdbxSource),
        SourceFormat::Yaml => Box::new(yaml::YamlTreeSource),
    }
}
