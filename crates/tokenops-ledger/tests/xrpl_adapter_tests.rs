//! # Integration Tests for the XRPL JSON-RPC Adapter
//!
//! Runs the adapter against wiremock servers standing in for an XRPL node
//! to verify request construction, response decoding, and error mapping.

use serde_json::json;
use tokenops_core::{Ledger, LedgerAddress};
use tokenops_ledger::{
    IssueTokenRequest, LedgerAdapter, LedgerError, TrustlineRequest, TxLookup, XrplConfig,
    XrplJsonRpcAdapter,
};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISSUER: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
const HOLDER: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";
const HASH: &str = "E3FE6EA3D48F0C2B639448020EA4F03D4F4F8FFDB243A852A0F59177921B4879";

fn adapter(server: &MockServer) -> XrplJsonRpcAdapter {
    let config = XrplConfig::for_url(&server.uri())
        .expect("url")
        .with_timeout_secs(5);
    XrplJsonRpcAdapter::new(&config).expect("adapter build")
}

fn signing_adapter(server: &MockServer) -> XrplJsonRpcAdapter {
    let config = XrplConfig::for_url(&server.uri())
        .expect("url")
        .with_timeout_secs(5)
        .with_issuer_secret("sEdTM1uX8pu2do5XvTnutH6HsouMaM2");
    XrplJsonRpcAdapter::new(&config).expect("adapter build")
}

fn addr(raw: &str) -> LedgerAddress {
    LedgerAddress::parse(Ledger::Xrpl, raw).expect("valid address")
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

// ── account_info ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_account_info_decodes_flags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "account_info",
            "params": [{ "account": ISSUER, "ledger_index": "validated" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "account_data": {
                    "Account": ISSUER,
                    "Balance": "99999980",
                    "Flags": 0x0081_0000u32,
                    "OwnerCount": 2,
                    "Sequence": 17
                },
                "status": "success",
                "validated": true
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = adapter(&server).account_info(&addr(ISSUER)).await.expect("info");
    assert_eq!(info.address, ISSUER);
    assert_eq!(info.sequence, 17);
    assert_eq!(info.owner_count, 2);
    assert!(info.require_auth());
}

#[tokio::test]
async fn test_account_info_without_require_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "account_info" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "account_data": { "Account": ISSUER, "Balance": "1", "Flags": 0, "Sequence": 1 },
                "status": "success"
            }
        })))
        .mount(&server)
        .await;

    let info = adapter(&server).account_info(&addr(ISSUER)).await.expect("info");
    assert!(!info.require_auth());
}

#[tokio::test]
async fn test_account_info_act_not_found_maps_to_account_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "account": ISSUER,
                "error": "actNotFound",
                "error_message": "Account not found.",
                "status": "error"
            }
        })))
        .mount(&server)
        .await;

    let err = adapter(&server).account_info(&addr(ISSUER)).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound { ref address } if address == ISSUER));
}

#[tokio::test]
async fn test_non_success_status_is_http_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server).account_info(&addr(ISSUER)).await.unwrap_err();
    match err {
        LedgerError::HttpStatus { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_result_is_deserialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "status": "success" }
        })))
        .mount(&server)
        .await;

    let err = adapter(&server).account_info(&addr(ISSUER)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Deserialization { .. }));
}

// ── tx / ledger ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_tx_validated_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "tx",
            "params": [{ "transaction": HASH }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "hash": HASH,
                "ledger_index": 4_567_890,
                "meta": { "TransactionResult": "tesSUCCESS" },
                "validated": true,
                "status": "success"
            }
        })))
        .mount(&server)
        .await;

    let lookup = adapter(&server).transaction_status(HASH).await.expect("lookup");
    assert_eq!(
        lookup,
        TxLookup::Validated {
            result_code: "tesSUCCESS".into(),
            ledger_index: 4_567_890
        }
    );
}

#[tokio::test]
async fn test_tx_not_yet_validated_is_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "hash": HASH, "validated": false, "status": "success" }
        })))
        .mount(&server)
        .await;

    assert_eq!(
        adapter(&server).transaction_status(HASH).await.expect("lookup"),
        TxLookup::Pending
    );
}

#[tokio::test]
async fn test_tx_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "error": "txnNotFound", "status": "error" }
        })))
        .mount(&server)
        .await;

    assert_eq!(
        adapter(&server).transaction_status(HASH).await.expect("lookup"),
        TxLookup::NotFound
    );
}

#[tokio::test]
async fn test_latest_validated_ledger_reads_index() {
    let server = MockServer::start().await;
    mount_validated_ledger(&server, 812).await;
    assert_eq!(adapter(&server).latest_validated_ledger().await.expect("ledger"), 812);
}

#[tokio::test]
async fn test_latest_validated_ledger_falls_back_to_header_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "ledger": { "ledger_index": "813" }, "status": "success" }
        })))
        .mount(&server)
        .await;
    assert_eq!(adapter(&server).latest_validated_ledger().await.expect("ledger"), 813);
}

// ── account_lines / gateway_balances ─────────────────────────────────

#[tokio::test]
async fn test_account_lines_follows_marker() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "account_lines",
            "params": [{ "marker": "page2" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "lines": [{ "account": HOLDER, "currency": "EUR", "balance": "0", "limit": "10" }],
                "status": "success"
            }
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "account_lines" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "lines": [{
                    "account": HOLDER, "currency": "USD", "balance": "-5",
                    "limit": "0", "authorized": true, "freeze": true
                }],
                "marker": "page2",
                "status": "success"
            }
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let lines = adapter(&server).get_account_lines(&addr(ISSUER)).await.expect("lines");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].currency, "USD");
    assert!(lines[0].authorized);
    assert!(lines[0].frozen);
    assert_eq!(lines[1].currency, "EUR");
    assert!(!lines[1].authorized);
}

#[tokio::test]
async fn test_gateway_balances_lists_obligations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "gateway_balances" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "account": ISSUER,
                "obligations": { "EUR": "12.5", "USD": "1000" },
                "status": "success"
            }
        })))
        .mount(&server)
        .await;

    let balances = adapter(&server).get_balances(&addr(ISSUER)).await.expect("balances");
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].currency, "EUR");
    assert_eq!(balances[1].value, "1000");
}

// ── submit ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_issue_token_without_secret_is_refused() {
    let server = MockServer::start().await;
    let request = IssueTokenRequest {
        issuer: addr(ISSUER),
        destination: addr(HOLDER),
        currency: "USD".into(),
        amount: "10".into(),
    };
    let err = adapter(&server).issue_token(&request).await.unwrap_err();
    assert!(matches!(err, LedgerError::SigningUnavailable { .. }));
}

#[tokio::test]
async fn test_issue_token_signs_payment_with_last_ledger_sequence() {
    let server = MockServer::start().await;
    mount_validated_ledger(&server, 1000).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "submit",
            "params": [{
                "tx_json": {
                    "TransactionType": "Payment",
                    "Account": ISSUER,
                    "Destination": HOLDER,
                    "Amount": { "currency": "USD", "issuer": ISSUER, "value": "10" },
                    "LastLedgerSequence": 1020
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "engine_result": "tesSUCCESS",
                "tx_json": { "hash": HASH, "LastLedgerSequence": 1020 },
                "status": "success"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = IssueTokenRequest {
        issuer: addr(ISSUER),
        destination: addr(HOLDER),
        currency: "USD".into(),
        amount: "10".into(),
    };
    let submitted = signing_adapter(&server).issue_token(&request).await.expect("submit");
    assert_eq!(submitted.tx_hash, HASH);
    assert_eq!(submitted.last_ledger_sequence, Some(1020));
    assert!(submitted.accepted());
}

#[tokio::test]
async fn test_authorizing_trustline_sets_auth_flag() {
    let server = MockServer::start().await;
    mount_validated_ledger(&server, 50).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "submit",
            "params": [{
                "tx_json": {
                    "TransactionType": "TrustSet",
                    "Account": ISSUER,
                    "LimitAmount": { "currency": "USD", "issuer": HOLDER, "value": "0" },
                    "Flags": 0x0001_0000u32
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "engine_result": "tesSUCCESS",
                "tx_json": { "hash": HASH },
                "status": "success"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = TrustlineRequest {
        account: addr(ISSUER),
        counterparty: addr(HOLDER),
        currency: "USD".into(),
        limit: "0".into(),
        authorize: true,
    };
    let submitted = signing_adapter(&server)
        .create_trustline(&request)
        .await
        .expect("submit");
    assert_eq!(submitted.last_ledger_sequence, Some(70));
}

#[tokio::test]
async fn test_submit_timeout_is_not_resent() {
    let server = MockServer::start().await;
    mount_validated_ledger(&server, 1000).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "submit" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_millis(1500))
                .set_body_json(json!({
                    "result": {
                        "engine_result": "tesSUCCESS",
                        "tx_json": { "hash": HASH, "LastLedgerSequence": 1020 },
                        "status": "success"
                    }
                })),
        )
        .mount(&server)
        .await;

    let config = XrplConfig::for_url(&server.uri())
        .expect("url")
        .with_timeout_secs(1)
        .with_issuer_secret("sEdTM1uX8pu2do5XvTnutH6HsouMaM2");
    let adapter = XrplJsonRpcAdapter::new(&config).expect("adapter build");
    let request = IssueTokenRequest {
        issuer: addr(ISSUER),
        destination: addr(HOLDER),
        currency: "USD".into(),
        amount: "10".into(),
    };

    let err = adapter.issue_token(&request).await.unwrap_err();
    assert!(matches!(err, LedgerError::Http { .. }));

    let submits = server
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .filter(|r| {
            serde_json::from_slice::<serde_json::Value>(&r.body)
                .map(|b| b["method"] == "submit")
                .unwrap_or(false)
        })
        .count();
    assert_eq!(submits, 1);
}
