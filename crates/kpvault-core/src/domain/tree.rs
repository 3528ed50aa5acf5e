//! Source tree shape
//!
//! Credential sources decode their container into this tree of named
//! groups. The core never parses source bytes itself; it only walks a
//! [`SourceGroup`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field holding the entry title
pub const FIELD_TITLE: &str = "Title";
/// Field holding the entry secret
pub const FIELD_PASSWORD: &str = "Password";
/// Field holding the login name (case-sensitive)
pub const FIELD_USERNAME: &str = "UserName";

/// A named group with its entries and child groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGroup {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<SourceEntry>,
    #[serde(default, alias = "subgroups")]
    pub groups: Vec<SourceGroup>,
}

/// A raw credential entry as the source stores it
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Source-assigned identifier, expected to be a UUID
    pub uuid: String,
    /// Comma-separated tag list as stored in the source
    #[serde(default)]
    pub tags: String,
    /// Every string field of the entry, including `Title`, `UserName` and `Password`
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl SourceGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_entry(mut self, entry: SourceEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn with_group(mut self, group: SourceGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Total number of entries in this group and all descendants
    pub fn entry_count(&self) -> usize {
        self.entries.len() + self.groups.iter().map(SourceGroup::entry_count).sum::<usize>()
    }
}

impl SourceEntry {
    pub fn new(uuid: impl Into<String>, title: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(FIELD_TITLE.to_string(), title.into());
        Self {
            uuid: uuid.into(),
            tags: String::new(),
            fields,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn title(&self) -> &str {
        self.fields.get(FIELD_TITLE).map(String::as_str).unwrap_or("")
    }
}

// Field values are secrets; keep them out of logs.
impl std::fmt::Debug for SourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEntry")
            .field("uuid", &self.uuid)
            .field("title", &self.title())
            .field("tags", &self.tags)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
