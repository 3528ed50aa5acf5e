//! End-to-end reconciliation against a mocked Vault server

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use kpvault_core::domain::tree::{SourceEntry, SourceGroup, FIELD_PASSWORD, FIELD_USERNAME};
use kpvault_sync::{Reconciler, SyncError, SyncOptions};

use crate::common;

fn tree_a_x() -> SourceGroup {
    SourceGroup::new("Root").with_group(
        SourceGroup::new("A").with_entry(
            SourceEntry::new("6f1c1b4e-7b0e-4d59-9a51-1b0b6f0c2a11", "x")
                .with_field(FIELD_USERNAME, "alice")
                .with_field(FIELD_PASSWORD, "s3cret"),
        ),
    )
}

async fn mount_existing_a_x_b_y(server: &wiremock::MockServer) {
    common::mount_list(server, "password", &["A/", "B/"]).await;
    common::mount_list(server, "password/A", &["x"]).await;
    common::mount_list(server, "password/B", &["y"]).await;
}

#[tokio::test]
async fn test_reconcile_reports_missing_secret() {
    let (server, store) = common::setup_vault_store().await;
    mount_existing_a_x_b_y(&server).await;
    common::mount_write(&server, "password/A/x", 1).await;
    common::mount_delete(&server, "password/B/y", 0).await;

    let summary = Reconciler::new(Arc::new(store), SyncOptions::default())
        .run(tree_a_x())
        .await
        .expect("reconcile failed");

    assert_eq!(summary.still_exist, 1);
    assert_eq!(summary.no_longer_exist, 1);
    assert_eq!(summary.new, 0);
    assert_eq!(
        summary.totals_line(),
        "Totals: 1 still exist, 1 no longer exist, 0 new, 0 filtered"
    );
}

#[tokio::test]
async fn test_reconcile_deletes_missing_secret() {
    let (server, store) = common::setup_vault_store().await;
    mount_existing_a_x_b_y(&server).await;
    common::mount_write(&server, "password/A/x", 1).await;
    common::mount_delete(&server, "password/B/y", 1).await;

    let options = SyncOptions {
        delete: true,
        ..SyncOptions::default()
    };
    let summary = Reconciler::new(Arc::new(store), options)
        .run(tree_a_x())
        .await
        .expect("reconcile failed");

    assert_eq!(summary.deleted, 1);
    assert_eq!(
        summary.totals_line(),
        "Totals: 1 still exist, 1 deleted, 0 new, 0 filtered"
    );
}

#[tokio::test]
async fn test_reconcile_retries_failed_writes() {
    let (server, store) = common::setup_vault_store().await;
    common::mount_list(&server, "password", &[]).await;
    Mock::given(method("PUT"))
        .and(path("/v1/password/A/x"))
        .respond_with(common::vault_error(500, "internal error"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    common::mount_write(&server, "password/A/x", 1).await;

    let summary = Reconciler::new(Arc::new(store), SyncOptions::default())
        .run(tree_a_x())
        .await
        .expect("reconcile failed");

    assert_eq!(summary.new, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(summary.write_failures, 0);
}

#[tokio::test]
async fn test_reconcile_aborts_on_scan_failure() {
    let (server, store) = common::setup_vault_store().await;
    Mock::given(method("GET"))
        .and(path("/v1/password"))
        .respond_with(common::vault_error(403, "permission denied"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = Reconciler::new(Arc::new(store), SyncOptions::default())
        .run(tree_a_x())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::ListFailed { .. }));
}
