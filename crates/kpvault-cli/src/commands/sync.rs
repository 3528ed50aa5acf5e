//! Sync command - Reconcile a KeePass database into Vault
//!
//! Provides the `kpvault sync` CLI command which:
//! 1. Applies command-line overrides to the loaded configuration
//! 2. Opens and decodes the source database
//! 3. Resolves the Vault token and checks it against the server
//! 4. Runs the Reconciler and displays the totals

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use kpvault_core::config::{Config, ConfigBuilder};
use kpvault_core::domain::tree::SourceGroup;
use kpvault_keepass::SourceFormat;
use kpvault_sync::{ReconcileSummary, Reconciler, SyncOptions};
use kpvault_vault::client::VaultClient;
use kpvault_vault::store::VaultKvStore;

use crate::credentials;
use crate::output::{
    format_duration_ms, get_formatter, OutputFormat, OutputFormatter, Severity,
};

/// Sync command with clap options
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// KeePass database (or .yaml export) to read
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Vault server address (defaults to VAULT_ADDR)
    #[arg(long)]
    pub address: Option<String>,

    /// KV mount to write secrets under
    #[arg(short, long)]
    pub mount: Option<String>,

    /// Only migrate entries carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Skip secrets whose path matches this regex (repeatable)
    #[arg(short, long)]
    pub exclude_path: Vec<String>,

    /// Delete secrets that no longer exist in the database
    #[arg(short, long)]
    pub delete: bool,

    /// Per-request timeout, e.g. `500ms`, `5s` or `2m` (bare numbers are seconds)
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
}

/// Parses a timeout such as `500ms`, `5s`, `2m` or `30`
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{value}'"))?;

    let duration = match unit.trim() {
        "ms" => Duration::from_millis(amount),
        "" | "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        other => return Err(format!("unknown unit '{other}' (use ms, s or m)")),
    };
    if duration.is_zero() {
        return Err("timeout must be greater than 0".to_string());
    }
    Ok(duration)
}

impl SyncCommand {
    /// Folds command-line flags over the file configuration
    fn apply(&self, config: Config) -> ConfigBuilder {
        let address = credentials::vault_address(self.address.as_deref(), &config.vault.address);
        let mut builder = ConfigBuilder::from_config(config).vault_address(address);
        if let Some(input) = &self.input {
            builder = builder.source_input(input.clone());
        }
        if let Some(mount) = &self.mount {
            builder = builder.vault_mount(mount.clone());
        }
        if let Some(tag) = &self.tag {
            builder = builder.filters_tag(tag.clone());
        }
        for pattern in &self.exclude_path {
            builder = builder.filters_exclude_path(pattern.clone());
        }
        if self.delete {
            builder = builder.sync_delete(true);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.vault_timeout(timeout);
        }
        builder
    }

    /// Execute the sync command
    ///
    /// Any failure before reconciliation starts is returned as an error,
    /// so the process exits non-zero without writing anything.
    pub async fn execute(&self, config: Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        // Step 1: Resolve configuration
        let config = match self.apply(config).build_validated() {
            Ok(config) => config,
            Err(errors) => {
                for err in &errors {
                    formatter.report(Severity::Error, &err.to_string());
                }
                bail!("Invalid configuration ({} errors)", errors.len());
            }
        };
        let options = SyncOptions::from_config(&config)?;

        // Step 2: Open the source
        let tree = open_source(config.source.input.clone()).await?;
        info!(
            input = %config.source.input.display(),
            entries = tree.entry_count(),
            "Source database loaded"
        );

        // Step 3: Connect to Vault
        let token = credentials::vault_token(&config.vault.address)?;
        let client = VaultClient::new(&config.vault.address, token)?;
        let token_info = tokio::time::timeout(options.timeout, client.lookup_self())
            .await
            .map_err(|_| anyhow::anyhow!("Vault did not answer within {:?}", options.timeout))?
            .context("Vault rejected the token")?;
        info!(
            address = %client.address(),
            token = %token_info.display_name,
            "Authenticated to Vault"
        );

        // Step 4: Reconcile
        formatter.line(&format!(
            "Syncing {} into {}/{} ...",
            config.source.input.display(),
            config.vault.address.trim_end_matches('/'),
            options.mount
        ));
        let store = Arc::new(VaultKvStore::new(client, options.mount.clone()));
        let summary = Reconciler::new(store, options).run(tree).await?;

        // Step 5: Display results
        display_summary(&summary, format, &*formatter);
        Ok(())
    }
}

/// Decodes the source on the blocking pool
async fn open_source(input: PathBuf) -> Result<SourceGroup> {
    let passphrase = if SourceFormat::detect(&input).needs_passphrase() {
        credentials::source_passphrase()?
    } else {
        secrecy::SecretString::from(String::new())
    };

    let source = kpvault_keepass::source_for(&input);
    tokio::task::spawn_blocking(move || source.open(&input, &passphrase))
        .await
        .context("Source decoding task failed")?
}

fn display_summary(
    summary: &ReconcileSummary,
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
) {
    if format == OutputFormat::Json {
        match serde_json::to_value(summary) {
            Ok(json) => formatter.document(&json),
            Err(err) => {
                formatter.report(Severity::Error, &format!("Failed to serialize summary: {err}"))
            }
        }
        return;
    }

    formatter.headline(&format!(
        "Sync completed in {}",
        format_duration_ms(summary.duration_ms)
    ));
    if let Some(started) = summary.started_at {
        let local = started.with_timezone(&chrono::Local);
        formatter.field("Started", &local.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    formatter.line(&summary.totals_line());
    formatter.field("Written", &summary.written.to_string());
    if summary.delete_enabled {
        formatter.field("Deleted", &summary.deleted.to_string());
    }
    if summary.skipped > 0 {
        formatter.report(
            Severity::Warning,
            &format!("Skipped {} unreadable", count(summary.skipped, "entry", "entries")),
        );
    }
    if summary.write_failures > 0 {
        formatter.report(
            Severity::Error,
            &format!("Failed to write {}", count(summary.write_failures, "secret", "secrets")),
        );
    }
    if summary.delete_failures > 0 {
        formatter.report(
            Severity::Error,
            &format!("Failed to delete {}", count(summary.delete_failures, "secret", "secrets")),
        );
    }
}

fn count(n: u64, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}
