//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including configuration validation and entry normalization failures.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An exclusion pattern could not be compiled
    #[error("Invalid exclude pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The pattern as supplied by the user
        pattern: String,
        /// Compiler error message
        reason: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors raised while converting a source entry into a `UniversalEntry`
///
/// A normalization failure only ever skips the offending entry; the
/// walk continues with the next one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// The source identifier is not a UUID
    #[error("Invalid entry identifier {id:?} at {location}")]
    InvalidIdentifier {
        /// The raw identifier
        id: String,
        /// Joined group path of the entry
        location: String,
    },

    /// The entry has no title, so no store key can be formed
    #[error("Entry {id} at {location:?} has an empty title")]
    EmptyTitle {
        /// Entry identifier
        id: String,
        /// Joined group path of the entry
        location: String,
    },
}
