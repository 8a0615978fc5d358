//! # XRPL JSON-RPC Adapter
//!
//! Implements [`LedgerAdapter`] against an XRPL node's JSON-RPC endpoint.
//!
//! | Trait method | RPC method |
//! |--------------|------------|
//! | `account_info` | `account_info` (validated ledger) |
//! | `get_account_lines` | `account_lines` (paged by marker) |
//! | `get_balances` | `gateway_balances` |
//! | `transaction_status` | `tx` |
//! | `latest_validated_ledger` | `ledger` |
//! | `issue_token` | `submit` (sign-and-submit `Payment`) |
//! | `create_trustline` | `submit` (sign-and-submit `TrustSet`) |
//!
//! Every call is a `POST` of `{"method": ..., "params": [{...}]}`. Read
//! calls retry transport failures with backoff; `submit` is sent once. The node
//! reports RPC errors inside a 200 response as `result.status = "error"`;
//! those become [`LedgerError::Rpc`], except `actNotFound`
//! ([`LedgerError::AccountNotFound`]) and `txnNotFound`
//! ([`TxLookup::NotFound`]).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;
use zeroize::Zeroizing;

use tokenops_core::{Ledger, LedgerAddress};

use crate::adapter::LedgerAdapter;
use crate::config::{ConfigError, XrplConfig};
use crate::error::LedgerError;
use crate::flags::{AccountFlags, TF_SETF_AUTH};
use crate::retry::with_backoff;
use crate::types::{
    AccountInfo, Balance, IssueTokenRequest, SubmittedTx, TrustLine, TrustlineRequest, TxLookup,
};

/// Ledgers a submitted transaction stays valid for before it expires.
pub const LAST_LEDGER_OFFSET: u32 = 20;

/// Upper bound on `account_lines` pages followed per call.
const MAX_LINE_PAGES: usize = 50;

// -- Wire types ---------------------------------------------------------------

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Value,
}

#[derive(Deserialize)]
struct AccountInfoResult {
    account_data: AccountRoot,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountRoot {
    account: String,
    #[serde(default)]
    flags: u32,
    #[serde(default)]
    sequence: u32,
    #[serde(default)]
    balance: String,
    #[serde(default)]
    owner_count: u32,
}

#[derive(Deserialize)]
struct AccountLinesResult {
    #[serde(default)]
    lines: Vec<RawTrustLine>,
    #[serde(default)]
    marker: Option<Value>,
}

#[derive(Deserialize)]
struct RawTrustLine {
    account: String,
    currency: String,
    balance: String,
    limit: String,
    #[serde(default)]
    authorized: bool,
    #[serde(default)]
    peer_authorized: bool,
    #[serde(default)]
    freeze: bool,
}

#[derive(Deserialize)]
struct GatewayBalancesResult {
    #[serde(default)]
    obligations: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct TxResult {
    #[serde(default)]
    validated: bool,
    #[serde(default)]
    ledger_index: Option<u32>,
    #[serde(default)]
    meta: Option<TxMeta>,
}

#[derive(Deserialize)]
struct TxMeta {
    #[serde(rename = "TransactionResult")]
    transaction_result: String,
}

#[derive(Deserialize)]
struct LedgerResult {
    #[serde(default)]
    ledger_index: Option<u32>,
    #[serde(default)]
    ledger: Option<Value>,
}

#[derive(Deserialize)]
struct SubmitResult {
    engine_result: String,
    tx_json: SubmittedTxJson,
}

#[derive(Deserialize)]
struct SubmittedTxJson {
    hash: String,
    #[serde(rename = "LastLedgerSequence", default)]
    last_ledger_sequence: Option<u32>,
}

// -- Adapter ------------------------------------------------------------------

/// XRPL node client over JSON-RPC.
#[derive(Clone)]
pub struct XrplJsonRpcAdapter {
    http: reqwest::Client,
    rpc_url: Url,
    issuer_secret: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for XrplJsonRpcAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrplJsonRpcAdapter")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("can_sign", &self.issuer_secret.is_some())
            .finish()
    }
}

impl XrplJsonRpcAdapter {
    /// Build an adapter from configuration.
    pub fn new(config: &XrplConfig) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            rpc_url: config.rpc_url.clone(),
            issuer_secret: config.issuer_secret.clone(),
        })
    }

    /// Issue one read-only JSON-RPC call, retrying transport failures.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let body = json!({ "method": method, "params": [params] });
        let resp = with_backoff(method, || {
            self.http.post(self.rpc_url.clone()).json(&body).send()
        })
        .await
        .map_err(|e| LedgerError::Http {
            method: method.into(),
            source: e,
        })?;
        Self::decode(method, resp).await
    }

    /// Issue one JSON-RPC call exactly once.
    ///
    /// After a transport failure on `submit` the outcome is unknown. The
    /// error is returned and the transaction is never re-signed.
    async fn call_once<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let body = json!({ "method": method, "params": [params] });
        let resp = self
            .http
            .post(self.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Http {
                method: method.into(),
                source: e,
            })?;
        Self::decode(method, resp).await
    }

    async fn decode<T: DeserializeOwned>(
        method: &str,
        resp: reqwest::Response,
    ) -> Result<T, LedgerError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::HttpStatus {
                method: method.into(),
                status,
                body,
            });
        }

        let envelope: RpcEnvelope = resp.json().await.map_err(|e| LedgerError::Deserialization {
            method: method.into(),
            reason: e.to_string(),
        })?;
        let result = envelope.result;

        if result.get("status").and_then(Value::as_str) == Some("error") {
            let code = result
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            let message = result
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or(&code)
                .to_string();
            return Err(LedgerError::Rpc {
                method: method.into(),
                code,
                message,
            });
        }

        serde_json::from_value(result).map_err(|e| LedgerError::Deserialization {
            method: method.into(),
            reason: e.to_string(),
        })
    }

    /// Sign with the configured secret and submit.
    async fn sign_and_submit(
        &self,
        operation: &'static str,
        mut tx_json: Value,
    ) -> Result<SubmittedTx, LedgerError> {
        let Some(secret) = self.issuer_secret.as_ref() else {
            return Err(LedgerError::SigningUnavailable { operation });
        };

        let last_ledger = self.latest_validated_ledger().await? + LAST_LEDGER_OFFSET;
        tx_json["LastLedgerSequence"] = json!(last_ledger);

        let params = json!({
            "secret": secret.as_str(),
            "tx_json": tx_json,
        });
        let submitted: SubmitResult = self.call_once("submit", params).await?;

        tracing::info!(
            operation,
            tx_hash = %submitted.tx_json.hash,
            engine_result = %submitted.engine_result,
            "transaction submitted"
        );

        Ok(SubmittedTx {
            tx_hash: submitted.tx_json.hash,
            engine_result: submitted.engine_result,
            last_ledger_sequence: submitted.tx_json.last_ledger_sequence.or(Some(last_ledger)),
        })
    }
}

fn account_not_found(err: LedgerError, address: &LedgerAddress) -> LedgerError {
    match err {
        LedgerError::Rpc { ref code, .. } if code == "actNotFound" => LedgerError::AccountNotFound {
            address: address.to_string(),
        },
        other => other,
    }
}

#[async_trait]
impl LedgerAdapter for XrplJsonRpcAdapter {
    fn ledger(&self) -> Ledger {
        Ledger::Xrpl
    }

    async fn issue_token(&self, request: &IssueTokenRequest) -> Result<SubmittedTx, LedgerError> {
        let tx_json = json!({
            "TransactionType": "Payment",
            "Account": request.issuer.as_str(),
            "Destination": request.destination.as_str(),
            "Amount": {
                "currency": request.currency,
                "issuer": request.issuer.as_str(),
                "value": request.amount,
            },
        });
        self.sign_and_submit("Payment", tx_json).await
    }

    async fn create_trustline(
        &self,
        request: &TrustlineRequest,
    ) -> Result<SubmittedTx, LedgerError> {
        let flags = if request.authorize { TF_SETF_AUTH } else { 0 };
        let tx_json = json!({
            "TransactionType": "TrustSet",
            "Account": request.account.as_str(),
            "LimitAmount": {
                "currency": request.currency,
                "issuer": request.counterparty.as_str(),
                "value": request.limit,
            },
            "Flags": flags,
        });
        self.sign_and_submit("TrustSet", tx_json).await
    }

    async fn get_balances(&self, issuer: &LedgerAddress) -> Result<Vec<Balance>, LedgerError> {
        let params = json!({
            "account": issuer.as_str(),
            "ledger_index": "validated",
            "strict": true,
        });
        let result: GatewayBalancesResult = self
            .call("gateway_balances", params)
            .await
            .map_err(|e| account_not_found(e, issuer))?;
        Ok(result
            .obligations
            .into_iter()
            .map(|(currency, value)| Balance { currency, value })
            .collect())
    }

    async fn get_account_lines(
        &self,
        account: &LedgerAddress,
    ) -> Result<Vec<TrustLine>, LedgerError> {
        let mut lines = Vec::new();
        let mut marker: Option<Value> = None;

        for _ in 0..MAX_LINE_PAGES {
            let mut params = json!({
                "account": account.as_str(),
                "ledger_index": "validated",
            });
            if let Some(m) = marker.take() {
                params["marker"] = m;
            }
            let page: AccountLinesResult = self
                .call("account_lines", params)
                .await
                .map_err(|e| account_not_found(e, account))?;

            lines.extend(page.lines.into_iter().map(|l| TrustLine {
                account: l.account,
                currency: l.currency,
                balance: l.balance,
                limit: l.limit,
                authorized: l.authorized,
                peer_authorized: l.peer_authorized,
                frozen: l.freeze,
            }));

            match page.marker {
                Some(m) if !m.is_null() => marker = Some(m),
                _ => return Ok(lines),
            }
        }

        tracing::warn!(
            account = %account,
            pages = MAX_LINE_PAGES,
            "account_lines pagination limit reached, result truncated"
        );
        Ok(lines)
    }

    async fn account_info(&self, address: &LedgerAddress) -> Result<AccountInfo, LedgerError> {
        let params = json!({
            "account": address.as_str(),
            "ledger_index": "validated",
        });
        let result: AccountInfoResult = self
            .call("account_info", params)
            .await
            .map_err(|e| account_not_found(e, address))?;
        let root = result.account_data;
        Ok(AccountInfo {
            address: root.account,
            flags: AccountFlags(root.flags),
            sequence: root.sequence,
            balance: root.balance,
            owner_count: root.owner_count,
        })
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TxLookup, LedgerError> {
        let params = json!({ "transaction": tx_hash, "binary": false });
        let result: TxResult = match self.call("tx", params).await {
            Ok(r) => r,
            Err(LedgerError::Rpc { code, .. }) if code == "txnNotFound" => {
                return Ok(TxLookup::NotFound)
            }
            Err(e) => return Err(e),
        };

        if !result.validated {
            return Ok(TxLookup::Pending);
        }
        match (result.meta, result.ledger_index) {
            (Some(meta), Some(ledger_index)) => Ok(TxLookup::Validated {
                result_code: meta.transaction_result,
                ledger_index,
            }),
            _ => Err(LedgerError::Deserialization {
                method: "tx".into(),
                reason: "validated transaction without meta or ledger_index".into(),
            }),
        }
    }

    async fn latest_validated_ledger(&self) -> Result<u32, LedgerError> {
        let result: LedgerResult = self
            .call("ledger", json!({ "ledger_index": "validated" }))
            .await?;

        if let Some(index) = result.ledger_index {
            return Ok(index);
        }
        // Some node versions only report the index inside the header, as a string.
        result
            .ledger
            .as_ref()
            .and_then(|l| l.get("ledger_index"))
            .and_then(|v| match v {
                Value::String(s) => s.parse().ok(),
                Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
                _ => None,
            })
            .ok_or_else(|| LedgerError::Deserialization {
                method: "ledger".into(),
                reason: "missing ledger_index".into(),
            })
    }
}
