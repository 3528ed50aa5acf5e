//! kpvault Vault - HashiCorp Vault KV client
//!
//! Provides:
//! - An HTTP client for the KV v1 secrets engine
//! - The [`store::VaultKvStore`] adapter implementing `ISecretStore`
//! - System keyring storage for the Vault token
//!
//! ## Modules
//!
//! - [`auth`] - Token storage in the system keyring
//! - [`client`] - Vault HTTP client (list, write, delete, token lookup)
//! - [`store`] - `ISecretStore` implementation over the client

pub mod auth;
pub mod client;
pub mod store;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when communicating with Vault
#[derive(Debug, Error)]
pub enum VaultError {
    /// The configured address is not a usable base URL
    #[error("Invalid Vault address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// A logical path has an empty or dot segment and would be rewritten
    /// by URL normalization
    #[error("Invalid Vault path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The token is missing, invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The token lacks a policy for the requested path
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// The requested path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Vault is sealed or failing (5xx)
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Any other unexpected status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error body returned by Vault: `{"errors": ["..."]}`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

impl VaultError {
    /// Maps a non-success status and its body to an error
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .filter(|b| !b.errors.is_empty())
            .map(|b| b.errors.join("; "))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("no error message")
                    .to_string()
            });

        match status {
            StatusCode::UNAUTHORIZED => VaultError::Unauthorized(message),
            StatusCode::FORBIDDEN => VaultError::Forbidden(message),
            StatusCode::NOT_FOUND => VaultError::NotFound(message),
            s if s.is_server_error() => VaultError::ServerError {
                status: s.as_u16(),
                message,
            },
            s => VaultError::UnexpectedStatus {
                status: s.as_u16(),
                message,
            },
        }
    }
}
