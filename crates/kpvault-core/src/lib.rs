//! kpvault Core - Domain logic for KeePass to Vault migration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `UniversalEntry`, `SourceGroup`, `SourceEntry`
//! - **Path codec** - deterministic mapping from group hierarchy to store keys
//! - **Port definitions** - Traits for adapters: `ISecretStore`, `ICredentialSource`
//! - **Configuration** - YAML-backed settings shared by every crate
//!
//! # Architecture
//!
//! The domain module contains pure logic with no I/O. Ports define the
//! trait interfaces that adapter crates (`kpvault-vault`, `kpvault-keepass`)
//! implement, and the sync engine in `kpvault-sync` drives them.

pub mod config;
pub mod domain;
pub mod ports;
