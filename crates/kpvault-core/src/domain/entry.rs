//! Universal entry
//!
//! The store-agnostic representation of one credential. Sources are
//! normalized into a [`UniversalEntry`], and the sync engine only ever
//! deals with this type and the [`KvPayload`] it renders.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use super::errors::NormalizationError;
use super::path;
use super::tree::{SourceEntry, FIELD_PASSWORD, FIELD_TITLE, FIELD_USERNAME};

/// Key/value payload written to the secret store
pub type KvPayload = BTreeMap<String, String>;

/// Payload field holding the login name
pub const KV_USERNAME: &str = "username";
/// Payload field holding the secret
pub const KV_PASSWORD: &str = "password";
/// Payload field holding the source identifier
pub const KV_UUID: &str = "keepass_uuid";
/// Payload field holding the comma-joined tags
pub const KV_TAGS: &str = "keepass_tags";
/// Payload field holding the literal path when escaping was lossy
pub const KV_ORIGINAL_PATH: &str = "original_path";

/// A normalized credential ready for reconciliation
#[derive(Clone, PartialEq, Eq)]
pub struct UniversalEntry {
    /// Stable source identifier
    pub id: Uuid,
    /// Group names root-to-leaf, excluding the entry name
    pub location: Vec<String>,
    /// Leaf display name
    pub name: String,
    pub username: String,
    pub password: String,
    /// Labels; a lone empty string counts as no tags
    pub tags: BTreeSet<String>,
    /// Remaining string fields, passed through verbatim
    pub extra: BTreeMap<String, String>,
}

impl UniversalEntry {
    /// Normalizes a source entry found at `location`
    ///
    /// `Title`, `Password` and `UserName` are lifted into dedicated fields
    /// and removed from the pass-through map. The tag string is split on
    /// commas; an empty tag string yields a single empty tag.
    ///
    /// # Errors
    /// Returns [`NormalizationError`] if the identifier is not a UUID or
    /// the title is empty.
    pub fn from_source(
        location: Vec<String>,
        source: &SourceEntry,
    ) -> Result<Self, NormalizationError> {
        let id = Uuid::parse_str(source.uuid.trim()).map_err(|_| {
            NormalizationError::InvalidIdentifier {
                id: source.uuid.clone(),
                location: path::joined_location(&location),
            }
        })?;

        let mut extra = source.fields.clone();
        let name = extra.remove(FIELD_TITLE).unwrap_or_default();
        if name.is_empty() {
            return Err(NormalizationError::EmptyTitle {
                id: id.to_string(),
                location: path::joined_location(&location),
            });
        }
        let password = extra.remove(FIELD_PASSWORD).unwrap_or_default();
        let username = extra.remove(FIELD_USERNAME).unwrap_or_default();

        let tags = source.tags.split(',').map(str::to_string).collect();

        Ok(Self {
            id,
            location,
            name,
            username,
            password,
            tags,
            extra,
        })
    }

    /// Whether the entry carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether the entry carries at least one non-empty tag
    pub fn has_tags(&self) -> bool {
        self.tags.iter().any(|t| !t.is_empty())
    }

    /// Non-empty tags joined by commas, in sorted order
    pub fn tags_joined(&self) -> String {
        self.tags
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The escaped store key for this entry
    pub fn key(&self) -> String {
        path::build_key(&self.location, &self.name)
    }

    /// The literal path of this entry before escaping
    pub fn unescaped_path(&self) -> String {
        path::unescaped_path(&self.location, &self.name)
    }

    /// Case-insensitive comparison of the unescaped locations
    pub fn equal_location(&self, other: &UniversalEntry) -> bool {
        path::locations_equal(&self.location, &other.location)
    }

    /// Renders the store key and the payload to write under it
    pub fn to_payload(&self) -> (String, KvPayload) {
        let key = self.key();
        let kv = self.payload_for(&key);
        (key, kv)
    }

    /// The payload to write under `target`
    ///
    /// The payload always has username, password and identifier. Tags are
    /// added only when present, `original_path` only when `target` differs
    /// from the literal path. Extra fields are merged last and win on
    /// collision.
    pub fn payload_for(&self, target: &str) -> KvPayload {
        let literal = self.unescaped_path();

        let mut kv = KvPayload::new();
        kv.insert(KV_USERNAME.to_string(), self.username.clone());
        kv.insert(KV_PASSWORD.to_string(), self.password.clone());
        kv.insert(KV_UUID.to_string(), self.id.to_string());
        if literal != target {
            kv.insert(KV_ORIGINAL_PATH.to_string(), literal);
        }
        if self.has_tags() {
            kv.insert(KV_TAGS.to_string(), self.tags_joined());
        }
        for (k, v) in &self.extra {
            kv.insert(k.clone(), v.clone());
        }
        kv
    }
}

impl std::fmt::Debug for UniversalEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniversalEntry")
            .field("id", &self.id)
            .field("location", &self.location)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tags", &self.tags)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}
