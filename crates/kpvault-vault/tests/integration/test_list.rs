//! Integration tests for listing and token lookup

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use kpvault_core::ports::secret_store::ISecretStore;
use kpvault_vault::VaultError;

use crate::common;

#[tokio::test]
async fn test_list_returns_child_keys() {
    let (server, client) = common::setup_vault_mock().await;
    common::mount_list(&server, "password", &["Router", "Work/"]).await;

    let keys = client.list("password").await.expect("list failed");

    assert_eq!(keys, vec!["Router".to_string(), "Work/".to_string()]);
}

#[tokio::test]
async fn test_list_missing_path_is_empty() {
    let (server, client) = common::setup_vault_mock().await;
    Mock::given(method("GET"))
        .and(path("/v1/password"))
        .and(query_param("list", "true"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({ "errors": [] })))
        .mount(&server)
        .await;

    let keys = client.list("password").await.expect("list failed");

    assert!(keys.is_empty());
}

#[tokio::test]
async fn test_list_permission_denied() {
    let (server, client) = common::setup_vault_mock().await;
    Mock::given(method("GET"))
        .and(path("/v1/password"))
        .respond_with(common::vault_error(403, "permission denied"))
        .mount(&server)
        .await;

    let err = client.list("password").await.unwrap_err();

    assert!(matches!(err, VaultError::Forbidden(ref m) if m == "permission denied"));
}

#[tokio::test]
async fn test_list_rejects_malformed_body() {
    let (server, client) = common::setup_vault_mock().await;
    Mock::given(method("GET"))
        .and(path("/v1/password"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.list("password").await.unwrap_err();

    assert!(matches!(err, VaultError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_store_list_adds_context() {
    let (server, store) = common::setup_vault_store().await;
    Mock::given(method("GET"))
        .and(path("/v1/password/Work"))
        .respond_with(common::vault_error(500, "internal error"))
        .mount(&server)
        .await;

    let err = store.list("password/Work").await.unwrap_err();

    let rendered = format!("{err:#}");
    assert!(rendered.contains("Failed to list password/Work"));
    assert!(rendered.contains("internal error"));
}

#[tokio::test]
async fn test_lookup_self_returns_token_info() {
    let (server, client) = common::setup_vault_mock().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "display_name": "token-migration",
                "policies": ["default", "kpvault"],
                "ttl": 3600
            }
        })))
        .mount(&server)
        .await;

    let info = client.lookup_self().await.expect("lookup failed");

    assert_eq!(info.display_name, "token-migration");
    assert_eq!(info.policies, vec!["default".to_string(), "kpvault".to_string()]);
    assert_eq!(info.ttl, 3600);
}

#[tokio::test]
async fn test_lookup_self_bad_token() {
    let (server, client) = common::setup_vault_mock().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(common::vault_error(403, "permission denied"))
        .mount(&server)
        .await;

    let err = client.lookup_self().await.unwrap_err();

    assert!(matches!(err, VaultError::Forbidden(_)));
}
