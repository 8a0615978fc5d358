//! # Issuance Watcher: End-to-End
//!
//! Reconciles submitted issuances in a memory store against a wiremock
//! XRPL node through the JSON-RPC adapter, then drives the scheduler
//! under paused time with a scripted ledger.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokenops_core::AssetId;
use tokenops_ledger::{MockLedger, TxLookup, XrplConfig, XrplJsonRpcAdapter};
use tokenops_state::{Issuance, IssuanceStatus, EXPIRED_REASON};
use tokenops_store::{MemoryStore, Store};
use tokenops_watcher::{run_scheduler, run_watcher_job, IssuanceWatcher};
use tokio::sync::watch;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONFIRMED_HASH: &str = "E3FE6EA3D48F0C2B639448020EA4F03D4F4F8FFDB243A852A0F59177921B4879";
const REJECTED_HASH: &str = "0A1B2C3D4E5F60718293A4B5C6D7E8F90A1B2C3D4E5F60718293A4B5C6D7E8F9";
const DROPPED_HASH: &str = "FFEEDDCCBBAA99887766554433221100FFEEDDCCBBAA99887766554433221100";
const HOLDER: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";

fn adapter(server: &MockServer) -> XrplJsonRpcAdapter {
    let config = XrplConfig::for_url(&server.uri())
        .expect("url")
        .with_timeout_secs(5);
    XrplJsonRpcAdapter::new(&config).expect("adapter build")
}

async fn mount_tx(server: &MockServer, hash: &str, result: serde_json::Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "tx",
            "params": [{ "transaction": hash }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
        .mount(server)
        .await;
}

async fn mount_validated_tx(server: &MockServer, hash: &str, code: &str, index: u32) {
    mount_tx(
        server,
        hash,
        json!({
            "hash": hash,
            "ledger_index": index,
            "meta": { "TransactionResult": code },
            "validated": true,
            "status": "success"
        }),
    )
    .await;
}

async fn mount_validated_ledger(server: &MockServer, index: u32) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "ledger" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "ledger_index": index, "validated": true, "status": "success" }
        })))
        .mount(server)
        .await;
}

async fn submit(store: &MemoryStore, hash: &str, lls: Option<u32>) -> Issuance {
    let issuance = Issuance::submitted(AssetId::new(), "250", HOLDER, hash, lls).unwrap();
    store.insert_issuance(&issuance).await.unwrap();
    issuance
}

// ---------------------------------------------------------------------------
// 1. One run against an XRPL node
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_run_finalizes_confirmed_rejected_and_expired() {
    let server = MockServer::start().await;
    mount_validated_tx(&server, CONFIRMED_HASH, "tesSUCCESS", 110).await;
    mount_validated_tx(&server, REJECTED_HASH, "tecNO_AUTH", 111).await;
    mount_tx(&server, DROPPED_HASH, json!({ "error": "txnNotFound", "status": "error" })).await;
    mount_validated_ledger(&server, 120).await;

    let store = MemoryStore::new();
    let confirmed = submit(&store, CONFIRMED_HASH, Some(130)).await;
    let rejected = submit(&store, REJECTED_HASH, Some(130)).await;
    let dropped = submit(&store, DROPPED_HASH, Some(100)).await;

    let report = run_watcher_job(&store, &adapter(&server)).await.unwrap();
    assert_eq!(report.checked, 3);
    assert_eq!(report.confirmed, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.errors, 0);

    let stored = store.get_issuance(confirmed.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IssuanceStatus::Confirmed);
    assert_eq!(stored.result_code.as_deref(), Some("tesSUCCESS"));
    assert_eq!(stored.ledger_index, Some(110));
    assert!(stored.finalized_at.is_some());

    let stored = store.get_issuance(rejected.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IssuanceStatus::Failed);
    assert_eq!(stored.result_code.as_deref(), Some("tecNO_AUTH"));
    assert_eq!(stored.failure_reason.as_deref(), Some("tecNO_AUTH"));

    let stored = store.get_issuance(dropped.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IssuanceStatus::Failed);
    assert_eq!(stored.failure_reason.as_deref(), Some(EXPIRED_REASON));
    assert!(stored.result_code.is_none());
}

#[tokio::test]
async fn test_not_found_within_window_stays_submitted() {
    let server = MockServer::start().await;
    mount_tx(&server, DROPPED_HASH, json!({ "error": "txnNotFound", "status": "error" })).await;
    mount_validated_ledger(&server, 100).await;

    let store = MemoryStore::new();
    let open = submit(&store, DROPPED_HASH, Some(100)).await;

    let report = run_watcher_job(&store, &adapter(&server)).await.unwrap();
    assert_eq!(report.unchanged, 1);
    let stored = store.get_issuance(open.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IssuanceStatus::Submitted);
}

#[tokio::test]
async fn test_rerun_leaves_finalized_issuances_alone() {
    let server = MockServer::start().await;
    mount_validated_tx(&server, CONFIRMED_HASH, "tesSUCCESS", 110).await;

    let store = MemoryStore::new();
    let issuance = submit(&store, CONFIRMED_HASH, None).await;
    let adapter = adapter(&server);

    run_watcher_job(&store, &adapter).await.unwrap();
    let first = store.get_issuance(issuance.id).await.unwrap().unwrap();

    let report = run_watcher_job(&store, &adapter).await.unwrap();
    assert_eq!(report.checked, 0);
    let second = store.get_issuance(issuance.id).await.unwrap().unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_node_errors_leave_issuances_for_the_next_run() {
    let server = MockServer::start().await;
    mount_tx(
        &server,
        CONFIRMED_HASH,
        json!({ "error": "tooBusy", "error_message": "The server is too busy.", "status": "error" }),
    )
    .await;
    mount_validated_tx(&server, REJECTED_HASH, "tecNO_AUTH", 111).await;

    let store = MemoryStore::new();
    let busy = submit(&store, CONFIRMED_HASH, None).await;
    submit(&store, REJECTED_HASH, None).await;

    let report = run_watcher_job(&store, &adapter(&server)).await.unwrap();
    assert_eq!(report.checked, 2);
    assert_eq!(report.errors, 1);
    assert_eq!(report.failed, 1);
    let stored = store.get_issuance(busy.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IssuanceStatus::Submitted);
}

// ---------------------------------------------------------------------------
// 2. Scheduler
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_scheduler_reconciles_until_shutdown() {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(MockLedger::default());
    let issuance = submit(&store, CONFIRMED_HASH, Some(50)).await;

    let watcher = IssuanceWatcher::new(store.clone(), ledger.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        run_scheduler(&watcher, Duration::from_secs(10), shutdown_rx).await
    });

    // First tick: not validated yet.
    tokio::time::sleep(Duration::from_secs(1)).await;
    let stored = store.get_issuance(issuance.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IssuanceStatus::Submitted);

    ledger.set_tx(
        CONFIRMED_HASH,
        TxLookup::Validated {
            result_code: "tesSUCCESS".into(),
            ledger_index: 42,
        },
    );
    tokio::time::sleep(Duration::from_secs(10)).await;
    let stored = store.get_issuance(issuance.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IssuanceStatus::Confirmed);

    shutdown_tx.send(true).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.runs, 2);
    assert_eq!(stats.failures, 0);
}
