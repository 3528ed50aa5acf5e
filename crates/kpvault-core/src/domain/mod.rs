//! Domain entities and business logic
//!
//! This module contains the core domain types for kpvault:
//! - Path escaping and key construction
//! - The source tree shape produced by credential sources
//! - The normalized `UniversalEntry` and its store payload
//! - Domain-specific error types

pub mod entry;
pub mod errors;
pub mod path;
pub mod tree;

// Re-export commonly used types
pub use entry::{KvPayload, UniversalEntry};
pub use errors::{DomainError, NormalizationError};
pub use tree::{SourceEntry, SourceGroup};
