//! KeePass KDBX source
//!
//! Decrypts a KDBX 3.1/4 database with the `keepass` crate and converts
//! its group tree into the core's [`SourceGroup`] shape. Protected values
//! are unlocked in memory; binary attachments are not carried over.

use std::fs::File;
use std::path::Path;

use anyhow::Result;
use keepass::db::{Entry, Group, Node};
use keepass::{Database, DatabaseKey};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use kpvault_core::domain::tree::{SourceEntry, SourceGroup};
use kpvault_core::ports::credential_source::ICredentialSource;

use crate::SourceError;

/// Credential source for KeePass databases
#[derive(Debug, Default, Clone, Copy)]
pub struct KdbxSource;

impl ICredentialSource for KdbxSource {
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    fn open(&self, path: &Path, passphrase: &SecretString) -> Result<SourceGroup> {
        let mut file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let key = DatabaseKey::new().with_password(passphrase.expose_secret());
        let db = Database::open(&mut file, key).map_err(|err| SourceError::Decode {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let root = convert_group(&db.root);
        info!(
            root = %root.name,
            entries = root.entry_count(),
            "Opened KeePass database"
        );
        Ok(root)
    }
}

/// Converts a decoded group and all of its descendants
pub fn convert_group(group: &Group) -> SourceGroup {
    let mut out = SourceGroup::new(group.name.clone());
    for node in &group.children {
        match node {
            Node::Entry(entry) => out.entries.push(convert_entry(entry)),
            Node::Group(child) => out.groups.push(convert_group(child)),
        }
    }
    out
}

/// Converts one entry, keeping every string field
fn convert_entry(entry: &Entry) -> SourceEntry {
    let mut out = SourceEntry {
        uuid: entry.uuid.to_string(),
        tags: entry.tags.join(","),
        ..SourceEntry::default()
    };

    for key in entry.fields.keys() {
        match entry.get(key) {
            Some(value) => {
                out.fields.insert(key.clone(), value.to_string());
            }
            None => debug!(uuid = %entry.uuid, field = %key, "Skipping binary field"),
        }
    }
    out
}
