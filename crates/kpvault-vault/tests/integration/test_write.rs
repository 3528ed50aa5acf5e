//! Integration tests for writing and deleting secrets

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use kpvault_core::domain::entry::KvPayload;
use kpvault_core::ports::secret_store::ISecretStore;
use kpvault_vault::VaultError;

use crate::common;

fn payload() -> KvPayload {
    let mut kv = KvPayload::new();
    kv.insert("username".to_string(), "alice".to_string());
    kv.insert("password".to_string(), "s3cret".to_string());
    kv.insert(
        "keepass_uuid".to_string(),
        "0b9c3f7e-5f5e-4b8a-9a51-6f1c1b4e7b0e".to_string(),
    );
    kv
}

#[tokio::test]
async fn test_write_sends_payload_as_json() {
    let (server, client) = common::setup_vault_mock().await;
    Mock::given(method("PUT"))
        .and(path("/v1/password/Work/Gmail"))
        .and(header("X-Vault-Token", common::TEST_TOKEN))
        .and(body_json(serde_json::json!({
            "username": "alice",
            "password": "s3cret",
            "keepass_uuid": "0b9c3f7e-5f5e-4b8a-9a51-6f1c1b4e7b0e"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .write("password/Work/Gmail", &payload())
        .await
        .expect("write failed");
}

#[tokio::test]
async fn test_store_put_prefixes_mount() {
    let (server, store) = common::setup_vault_store().await;
    common::mount_write(&server, "password/Work-Legal/Contract_DB", 1).await;

    store
        .put("Work-Legal/Contract_DB", &payload())
        .await
        .expect("put failed");
}

#[tokio::test]
async fn test_write_server_error() {
    let (server, client) = common::setup_vault_mock().await;
    Mock::given(method("PUT"))
        .and(path("/v1/password/Work/Gmail"))
        .respond_with(common::vault_error(503, "Vault is sealed"))
        .mount(&server)
        .await;

    let err = client
        .write("password/Work/Gmail", &payload())
        .await
        .unwrap_err();

    match err {
        VaultError::ServerError { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Vault is sealed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_store_delete_prefixes_mount() {
    let (server, store) = common::setup_vault_store().await;
    common::mount_delete(&server, "password/B/y", 1).await;

    store.delete("B/y").await.expect("delete failed");
}

#[tokio::test]
async fn test_delete_missing_secret_succeeds() {
    let (server, client) = common::setup_vault_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/password/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    client.delete("password/gone").await.expect("delete failed");
}

#[tokio::test]
async fn test_delete_forbidden() {
    let (server, store) = common::setup_vault_store().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/password/B/y"))
        .respond_with(common::vault_error(403, "permission denied"))
        .mount(&server)
        .await;

    let err = store.delete("B/y").await.unwrap_err();

    assert!(format!("{err:#}").contains("permission denied"));
}
