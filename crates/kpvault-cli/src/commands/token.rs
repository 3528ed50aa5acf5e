//! Token command - Manage the Vault token kept in the system keyring

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::json;

use kpvault_core::config::Config;
use kpvault_vault::auth::KeyringTokenStorage;
use kpvault_vault::client::VaultClient;

use crate::credentials;
use crate::output::{get_formatter, OutputFormat, Severity};

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Store a token (from VAULT_TOKEN or a prompt) in the keyring
    Store {
        /// Vault server address the token belongs to
        #[arg(long)]
        address: Option<String>,
    },
    /// Remove the stored token
    Clear {
        #[arg(long)]
        address: Option<String>,
    },
    /// Show whether a token is stored and whether Vault accepts it
    Status {
        #[arg(long)]
        address: Option<String>,
    },
}

impl TokenCommand {
    pub async fn execute(&self, config: Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        match self {
            TokenCommand::Store { address } => {
                let address =
                    credentials::vault_address(address.as_deref(), &config.vault.address);
                let token = credentials::token_to_store()?;
                KeyringTokenStorage::store(&address, &token)?;

                if format == OutputFormat::Json {
                    formatter.document(&json!({ "address": address, "stored": true }));
                } else {
                    formatter.headline(&format!("Token stored for {address}"));
                }
            }
            TokenCommand::Clear { address } => {
                let address =
                    credentials::vault_address(address.as_deref(), &config.vault.address);
                KeyringTokenStorage::clear(&address)?;

                if format == OutputFormat::Json {
                    formatter.document(&json!({ "address": address, "cleared": true }));
                } else {
                    formatter.headline(&format!("Token cleared for {address}"));
                }
            }
            TokenCommand::Status { address } => {
                let address =
                    credentials::vault_address(address.as_deref(), &config.vault.address);
                let Some(token) = KeyringTokenStorage::load(&address)? else {
                    if format == OutputFormat::Json {
                        formatter.document(&json!({ "address": address, "stored": false }));
                    } else {
                        formatter
                            .report(Severity::Warning, &format!("No token stored for {address}"));
                        formatter.line("Run 'kpvault token store' to save one");
                    }
                    return Ok(());
                };

                let client = VaultClient::new(&address, token)?;
                let lookup = tokio::time::timeout(config.vault.timeout(), client.lookup_self())
                    .await
                    .context("Vault did not answer in time")?;

                match lookup {
                    Ok(info) => {
                        if format == OutputFormat::Json {
                            formatter.document(&json!({
                                "address": address,
                                "stored": true,
                                "valid": true,
                                "token": info,
                            }));
                        } else {
                            formatter.headline(&format!("Token for {address} is valid"));
                            formatter.field("Name", &info.display_name);
                            formatter.field("Policies", &info.policies.join(", "));
                            let ttl = if info.ttl == 0 {
                                "never expires".to_string()
                            } else {
                                format!("{}s", info.ttl)
                            };
                            formatter.field("TTL", &ttl);
                        }
                    }
                    Err(err) => {
                        if format == OutputFormat::Json {
                            formatter.document(&json!({
                                "address": address,
                                "stored": true,
                                "valid": false,
                                "error": err.to_string(),
                            }));
                        } else {
                            formatter.report(
                                Severity::Error,
                                &format!("Stored token was rejected: {err}"),
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
