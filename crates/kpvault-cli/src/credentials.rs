//! Secret acquisition for the CLI
//!
//! The core only ever receives a `SecretString`; this module decides where
//! it comes from.
//!
//! - Source passphrase: `KPVAULT_PASSPHRASE`, then an interactive prompt
//! - Vault token: `VAULT_TOKEN`, `~/.vault-token`, the system keyring,
//!   then an interactive prompt
//! - Vault address: `--address`, `VAULT_ADDR`, then the config file

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use tracing::{debug, warn};

use kpvault_vault::auth::KeyringTokenStorage;

/// Environment variable holding the source database passphrase
pub const PASSPHRASE_ENV_VAR: &str = "KPVAULT_PASSPHRASE";

/// Environment variable holding the Vault token
pub const TOKEN_ENV_VAR: &str = "VAULT_TOKEN";

/// Environment variable holding the Vault address
pub const ADDR_ENV_VAR: &str = "VAULT_ADDR";

/// Reads a non-empty environment variable
fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Prompts on the terminal without echo; `None` when stdin is not a TTY
fn prompt_secret(label: &str) -> Result<Option<SecretString>> {
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }
    eprint!("{label}: ");
    let value = rpassword::read_password().context("Failed to read from terminal")?;
    if value.is_empty() {
        bail!("empty {} not allowed", label.to_lowercase());
    }
    Ok(Some(SecretString::from(value)))
}

/// Passphrase for the source database
pub fn source_passphrase() -> Result<SecretString> {
    if let Some(value) = non_empty_env(PASSPHRASE_ENV_VAR) {
        debug!("Using passphrase from {}", PASSPHRASE_ENV_VAR);
        return Ok(SecretString::from(value));
    }

    if let Some(passphrase) = prompt_secret("KeePass passphrase")? {
        return Ok(passphrase);
    }

    bail!(
        "No passphrase provided. Set {} or run interactively.",
        PASSPHRASE_ENV_VAR
    )
}

/// Vault address, in precedence order flag > environment > config
pub fn vault_address(flag: Option<&str>, configured: &str) -> String {
    flag.map(str::to_string)
        .or_else(|| non_empty_env(ADDR_ENV_VAR))
        .unwrap_or_else(|| configured.to_string())
}

/// Location of the token file written by `vault login`
pub fn token_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".vault-token"))
}

/// Reads a token file; a missing or blank file yields `None`
pub fn read_token_file(path: &Path) -> Result<Option<SecretString>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let token = content.trim();
            if token.is_empty() {
                Ok(None)
            } else {
                Ok(Some(SecretString::from(token.to_string())))
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(anyhow::Error::new(err).context(format!("Failed to read {}", path.display())))
        }
    }
}

/// Token for the Vault server at `address`
pub fn vault_token(address: &str) -> Result<SecretString> {
    if let Some(value) = non_empty_env(TOKEN_ENV_VAR) {
        debug!("Using Vault token from {}", TOKEN_ENV_VAR);
        return Ok(SecretString::from(value));
    }

    if let Some(path) = token_file_path() {
        if let Some(token) = read_token_file(&path)? {
            debug!(path = %path.display(), "Using Vault token file");
            return Ok(token);
        }
    }

    match KeyringTokenStorage::load(address) {
        Ok(Some(token)) => return Ok(token),
        Ok(None) => {}
        Err(err) => warn!(error = %format!("{err:#}"), "Keyring unavailable"),
    }

    if let Some(token) = prompt_secret("Vault token")? {
        return Ok(token);
    }

    bail!(
        "No Vault token found. Set {}, run 'vault login', or run 'kpvault token store'.",
        TOKEN_ENV_VAR
    )
}

/// Token to store in the keyring: `VAULT_TOKEN` or an interactive prompt
pub fn token_to_store() -> Result<SecretString> {
    if let Some(value) = non_empty_env(TOKEN_ENV_VAR) {
        return Ok(SecretString::from(value));
    }
    prompt_secret("Vault token")?
        .with_context(|| format!("No token provided. Set {} or run interactively.", TOKEN_ENV_VAR))
}
