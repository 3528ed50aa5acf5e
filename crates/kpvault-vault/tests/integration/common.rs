//! Shared test helpers for Vault API integration tests
//!
//! Provides wiremock-based mock server setup for the KV v1 endpoints.
//! Each helper mounts the necessary mock endpoints on a server created by
//! [`setup_vault_mock`].

use secrecy::SecretString;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kpvault_vault::client::VaultClient;
use kpvault_vault::store::VaultKvStore;

/// Token every mounted endpoint expects
pub const TEST_TOKEN: &str = "hvs.test-token";

/// Starts a mock server and returns a client pointing at it
pub async fn setup_vault_mock() -> (MockServer, VaultClient) {
    let server = MockServer::start().await;
    let client = VaultClient::new(&server.uri(), SecretString::from(TEST_TOKEN.to_string()))
        .expect("valid mock server address");
    (server, client)
}

/// Starts a mock server and returns a store for the `password` mount
pub async fn setup_vault_store() -> (MockServer, VaultKvStore) {
    let (server, client) = setup_vault_mock().await;
    (server, VaultKvStore::new(client, "password"))
}

/// Mounts `GET /v1/{logical}?list=true` returning `keys`
pub async fn mount_list(server: &MockServer, logical: &str, keys: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/{logical}")))
        .and(query_param("list", "true"))
        .and(header("X-Vault-Token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "request_id": "00000000-0000-0000-0000-000000000000",
            "lease_id": "",
            "renewable": false,
            "lease_duration": 0,
            "data": { "keys": keys },
            "wrap_info": null,
            "warnings": null,
            "auth": null
        })))
        .mount(server)
        .await;
}

/// Mounts `PUT /v1/{logical}` answering 204, expecting `times` calls
pub async fn mount_write(server: &MockServer, logical: &str, times: u64) {
    Mock::given(method("PUT"))
        .and(path(format!("/v1/{logical}")))
        .and(header("X-Vault-Token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(204))
        .expect(times)
        .mount(server)
        .await;
}

/// Mounts `DELETE /v1/{logical}` answering 204, expecting `times` calls
pub async fn mount_delete(server: &MockServer, logical: &str, times: u64) {
    Mock::given(method("DELETE"))
        .and(path(format!("/v1/{logical}")))
        .and(header("X-Vault-Token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(204))
        .expect(times)
        .mount(server)
        .await;
}

/// A Vault error response
pub fn vault_error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({ "errors": [message] }))
}
