//! kpvault CLI - Command-line interface for kpvault
//!
//! Provides commands for:
//! - Migrating and reconciling a KeePass database into Vault KV
//! - Managing the Vault token kept in the system keyring

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kpvault_core::config::Config;

mod commands;
mod credentials;
mod output;

use commands::{sync::SyncCommand, token::TokenCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "kpvault",
    version,
    about = "Migrate KeePass credentials into HashiCorp Vault"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy entries into Vault and report secrets missing from the source
    Sync(SyncCommand),
    /// Manage the Vault token stored in the system keyring
    #[command(subcommand)]
    Token(TokenCommand),
}

/// Loads the config file; an explicit `--config` must exist and parse
fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display())),
        None => Ok(Config::load_or_default(&Config::default_path())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    // Setup tracing
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(config, format).await,
        Commands::Token(cmd) => cmd.execute(config, format).await,
    }
}
