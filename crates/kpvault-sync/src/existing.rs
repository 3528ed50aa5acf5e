//! Existing-path set
//!
//! Snapshot of every key found under the target mount before the run
//! starts, each with a "seen in source" flag. Only the consumer loop of
//! the engine mutates it, so it needs no locking.

use std::collections::{BTreeMap, HashMap};

use kpvault_core::domain::path::fold_key;

/// Outcome of looking up a source key against the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key (or a case variant of it) existed and is now marked seen
    Matched(String),
    /// Another source entry already claimed this target key
    ///
    /// Carries the key the first claimant resolved to.
    Duplicate(String),
    /// The key is not in the store yet
    New,
}

/// Keys present in the target store with their seen flags
#[derive(Debug, Default, Clone)]
pub struct ExistingPathSet {
    paths: BTreeMap<String, bool>,
    /// Folded key -> existing keys that fold to it
    folded: HashMap<String, Vec<String>>,
    /// Folded form -> first new key produced for it during this run
    produced: HashMap<String, String>,
}

impl ExistingPathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key discovered by the scanner, initially unseen
    pub fn insert(&mut self, key: impl Into<String>) {
        let key = key.into();
        if self.paths.contains_key(&key) {
            return;
        }
        self.folded
            .entry(fold_key(&key))
            .or_default()
            .push(key.clone());
        self.paths.insert(key, false);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.paths.contains_key(key)
    }

    pub fn is_seen(&self, key: &str) -> bool {
        self.paths.get(key).copied().unwrap_or(false)
    }

    /// Classifies `key` and marks the matching existing key as seen
    ///
    /// An exact match is preferred. Otherwise the first unseen existing
    /// key that differs only by case is claimed. Keys that fold onto an
    /// already claimed target, or onto a new key produced earlier in the
    /// run, are duplicates.
    pub fn mark_seen(&mut self, key: &str) -> Lookup {
        if let Some(seen) = self.paths.get_mut(key) {
            if *seen {
                return Lookup::Duplicate(key.to_string());
            }
            *seen = true;
            return Lookup::Matched(key.to_string());
        }

        let folded = fold_key(key);
        if let Some(candidates) = self.folded.get(&folded) {
            for candidate in candidates {
                if let Some(seen) = self.paths.get_mut(candidate) {
                    if !*seen {
                        *seen = true;
                        return Lookup::Matched(candidate.clone());
                    }
                }
            }
            return Lookup::Duplicate(candidates[0].clone());
        }

        match self.produced.get(&folded) {
            Some(first) => Lookup::Duplicate(first.clone()),
            None => {
                self.produced.insert(folded, key.to_string());
                Lookup::New
            }
        }
    }

    /// Keys matched by at least one source entry
    pub fn seen(&self) -> impl Iterator<Item = &str> {
        self.paths
            .iter()
            .filter(|(_, seen)| **seen)
            .map(|(key, _)| key.as_str())
    }

    /// Keys no source entry matched, in sorted order
    pub fn unseen(&self) -> impl Iterator<Item = &str> {
        self.paths
            .iter()
            .filter(|(_, seen)| !**seen)
            .map(|(key, _)| key.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for ExistingPathSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_marks_seen() {
        let mut set: ExistingPathSet = ["A/x", "B/y"].into_iter().collect();
        assert_eq!(set.mark_seen("A/x"), Lookup::Matched("A/x".to_string()));
        assert!(set.is_seen("A/x"));
        assert!(!set.is_seen("B/y"));
        assert_eq!(set.unseen().collect::<Vec<_>>(), vec!["B/y"]);
    }

    #[test]
    fn test_second_match_is_duplicate() {
        let mut set: ExistingPathSet = ["A/x"].into_iter().collect();
        set.mark_seen("A/x");
        assert_eq!(set.mark_seen("A/x"), Lookup::Duplicate("A/x".to_string()));
    }

    #[test]
    fn test_case_variant_claims_existing_key() {
        let mut set: ExistingPathSet = ["Work/Gmail"].into_iter().collect();
        assert_eq!(
            set.mark_seen("work/Gmail"),
            Lookup::Matched("Work/Gmail".to_string())
        );
        assert_eq!(
            set.mark_seen("Work/Gmail"),
            Lookup::Duplicate("Work/Gmail".to_string())
        );
        assert_eq!(set.unseen().count(), 0);
    }

    #[test]
    fn test_exact_match_preferred_over_case_variant() {
        let mut set: ExistingPathSet = ["Work/x", "work/x"].into_iter().collect();
        assert_eq!(set.mark_seen("work/x"), Lookup::Matched("work/x".to_string()));
        assert_eq!(set.mark_seen("WORK/x"), Lookup::Matched("Work/x".to_string()));
        assert_eq!(set.seen().count(), 2);
    }

    #[test]
    fn test_new_keys_collide_case_insensitively() {
        let mut set = ExistingPathSet::new();
        assert_eq!(set.mark_seen("Home/Router"), Lookup::New);
        assert_eq!(
            set.mark_seen("home/Router"),
            Lookup::Duplicate("Home/Router".to_string())
        );
        assert!(set.is_empty());
    }

    #[test]
    fn test_insert_ignores_repeats() {
        let mut set = ExistingPathSet::new();
        set.insert("a");
        set.insert("a");
        assert_eq!(set.len(), 1);
        assert!(set.contains("a"));
    }
}
