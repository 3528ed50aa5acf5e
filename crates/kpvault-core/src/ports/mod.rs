//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the reconciliation core depends on, whose
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ISecretStore`] - Flat key-value secret store (HashiCorp Vault KV)
//! - [`ICredentialSource`] - Hierarchical credential database (KeePass)

pub mod credential_source;
pub mod secret_store;

pub use credential_source::ICredentialSource;
pub use secret_store::ISecretStore;
