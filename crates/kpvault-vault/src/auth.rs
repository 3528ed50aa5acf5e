//! Vault token storage
//!
//! This module provides:
//! - [`KeyringTokenStorage`] - Secure token storage using the system keyring
//!
//! Tokens are stored under the service name `kpvault`, with the Vault
//! server address as the keyring username, so one token can be kept per
//! server.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

/// Keyring service name for storing tokens
const KEYRING_SERVICE: &str = "kpvault";

// ============================================================================
// KeyringTokenStorage
// ============================================================================

/// Stores and retrieves Vault tokens from the system keyring
///
/// Uses the `keyring` crate to store tokens securely in the OS credential
/// store (e.g., GNOME Keyring, KDE Wallet, macOS Keychain).
pub struct KeyringTokenStorage;

impl KeyringTokenStorage {
    /// Keyring username for a Vault address
    ///
    /// Trailing slashes are dropped so `https://vault:8200` and
    /// `https://vault:8200/` share one entry.
    pub fn account(address: &str) -> String {
        address.trim().trim_end_matches('/').to_string()
    }

    /// Stores the token for the given Vault address
    pub fn store(address: &str, token: &SecretString) -> Result<()> {
        let account = Self::account(address);
        let entry = keyring::Entry::new(KEYRING_SERVICE, &account)
            .context("Failed to create keyring entry")?;

        entry
            .set_password(token.expose_secret())
            .context("Failed to store token in keyring")?;

        debug!("Stored Vault token in keyring for {}", account);
        Ok(())
    }

    /// Loads the token for the given Vault address
    ///
    /// # Returns
    /// `Some(token)` if found, `None` if no token is stored
    pub fn load(address: &str) -> Result<Option<SecretString>> {
        let account = Self::account(address);
        let entry = keyring::Entry::new(KEYRING_SERVICE, &account)
            .context("Failed to create keyring entry")?;

        match entry.get_password() {
            Ok(token) => {
                debug!("Loaded Vault token from keyring for {}", account);
                Ok(Some(SecretString::from(token)))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No Vault token in keyring for {}", account);
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read token from keyring")),
        }
    }

    /// Removes the token for the given Vault address
    ///
    /// Clearing an address with no stored token is not an error.
    pub fn clear(address: &str) -> Result<()> {
        let account = Self::account(address);
        let entry = keyring::Entry::new(KEYRING_SERVICE, &account)
            .context("Failed to create keyring entry")?;

        match entry.delete_credential() {
            Ok(()) => {
                info!("Cleared Vault token from keyring for {}", account);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No Vault token to clear for {}", account);
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}
