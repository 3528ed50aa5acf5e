//! Integration tests for kpvault-vault
//!
//! Uses wiremock to simulate the Vault HTTP API and verifies end-to-end
//! behavior of the VaultClient, the VaultKvStore adapter, and a full
//! reconciliation run against it.

mod common;

mod test_list;
mod test_reconcile;
mod test_write;
