//! Vault HTTP client
//!
//! Provides a typed HTTP client for the KV v1 secrets engine of HashiCorp
//! Vault. Handles the token header, path encoding and status mapping.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kpvault_vault::client::VaultClient;
//! use secrecy::SecretString;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let token = SecretString::from("hvs.example".to_string());
//! let client = VaultClient::new("https://127.0.0.1:8200", token)?;
//! let children = client.list("password/Work").await?;
//! println!("{} children", children.len());
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use kpvault_core::domain::entry::KvPayload;

use crate::VaultError;

/// Header carrying the client token
const TOKEN_HEADER: &str = "X-Vault-Token";

/// API version prefix of every endpoint
const API_PREFIX: &str = "v1";

// ============================================================================
// Vault API response types
// ============================================================================

/// Response from a `?list=true` request
#[derive(Debug, Deserialize)]
struct ListResponse {
    data: ListData,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    keys: Vec<String>,
}

/// Response from `auth/token/lookup-self`
#[derive(Debug, Deserialize)]
struct LookupResponse {
    data: TokenInfo,
}

/// Details about the client token
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub policies: Vec<String>,
    /// Remaining lifetime in seconds; 0 means the token never expires
    #[serde(default)]
    pub ttl: u64,
}

// ============================================================================
// VaultClient
// ============================================================================

/// HTTP client for Vault KV v1 calls
///
/// Wraps `reqwest::Client` with the token header and base URL
/// construction. Paths are logical Vault paths such as `password/Work/VPN`;
/// each segment is percent-encoded when the URL is built.
pub struct VaultClient {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl VaultClient {
    /// Creates a new client for the Vault server at `address`
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidAddress`] if `address` is not an
    /// absolute http(s) URL.
    pub fn new(address: &str, token: SecretString) -> Result<Self, VaultError> {
        Self::with_client(Client::new(), address, token)
    }

    /// Creates a client reusing an existing `reqwest::Client`
    pub fn with_client(
        client: Client,
        address: &str,
        token: SecretString,
    ) -> Result<Self, VaultError> {
        let invalid = |reason: String| VaultError::InvalidAddress {
            address: address.to_string(),
            reason,
        };

        let base_url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base_url.scheme())));
        }
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// The server address this client talks to
    pub fn address(&self) -> &str {
        self.base_url.as_str()
    }

    /// Builds the endpoint URL for a logical Vault path
    ///
    /// Leading and trailing separators are ignored. Empty, `.` and `..`
    /// segments are rejected rather than normalized away, so the request
    /// always targets exactly `path`.
    pub fn endpoint(&self, path: &str) -> Result<Url, VaultError> {
        let trimmed = path.trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(VaultError::InvalidPath {
                path: path.to_string(),
                reason: if bad.is_empty() {
                    "empty segment".to_string()
                } else {
                    format!("dot segment '{bad}'")
                },
            });
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| VaultError::InvalidAddress {
                address: self.base_url.to_string(),
                reason: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .push(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Creates an authenticated request builder for the given method and path
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, VaultError> {
        Ok(self
            .client
            .request(method, self.endpoint(path)?)
            .header(TOKEN_HEADER, self.token.expose_secret()))
    }

    /// Lists the immediate children of `path`
    ///
    /// Sub-namespaces come back with a trailing `/`. A path with no
    /// secrets below it answers 404, which is reported as an empty list.
    pub async fn list(&self, path: &str) -> Result<Vec<String>, VaultError> {
        debug!(path, "Listing Vault path");

        let response = self
            .request(Method::GET, path)?
            .query(&[("list", "true")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(path, "Nothing stored under path");
            return Ok(Vec::new());
        }

        let body: ListResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| VaultError::InvalidResponse(format!("list {path}: {e}")))?;

        Ok(body.data.keys)
    }

    /// Writes `payload` as the secret at `path`, replacing any previous value
    pub async fn write(&self, path: &str, payload: &KvPayload) -> Result<(), VaultError> {
        debug!(path, fields = payload.len(), "Writing Vault secret");

        let response = self.request(Method::PUT, path)?.json(payload).send().await?;
        check(response).await?;
        Ok(())
    }

    /// Deletes the secret at `path`; deleting a missing secret succeeds
    pub async fn delete(&self, path: &str) -> Result<(), VaultError> {
        debug!(path, "Deleting Vault secret");

        let response = self.request(Method::DELETE, path)?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }

    /// Looks up the client token, verifying it is accepted by the server
    pub async fn lookup_self(&self) -> Result<TokenInfo, VaultError> {
        let response = self
            .request(Method::GET, "auth/token/lookup-self")?
            .send()
            .await?;

        let body: LookupResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| VaultError::InvalidResponse(format!("token lookup: {e}")))?;

        Ok(body.data)
    }
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Passes successful responses through and maps the rest to [`VaultError`]
async fn check(response: Response) -> Result<Response, VaultError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(VaultError::from_status(status, &body))
}
