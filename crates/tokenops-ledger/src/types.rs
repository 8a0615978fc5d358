//! Request and response types shared by all ledger adapters.

use serde::{Deserialize, Serialize};

use tokenops_core::LedgerAddress;

use crate::flags::AccountFlags;

/// Account root data as returned by `account_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub address: String,
    /// Raw flags bitmask of the account root.
    pub flags: AccountFlags,
    pub sequence: u32,
    /// Native balance in the ledger's smallest unit, as a decimal string.
    pub balance: String,
    pub owner_count: u32,
}

impl AccountInfo {
    pub fn require_auth(&self) -> bool {
        self.flags.require_auth()
    }
}

/// A trustline as seen from the queried account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustLine {
    /// The counterparty account.
    pub account: String,
    pub currency: String,
    /// Balance from the queried account's perspective.
    pub balance: String,
    pub limit: String,
    /// The queried account authorized the counterparty.
    pub authorized: bool,
    /// The counterparty authorized the queried account.
    pub peer_authorized: bool,
    pub frozen: bool,
}

/// Outstanding obligation of an issuer in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub currency: String,
    pub value: String,
}

/// Result of looking up a transaction by hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxLookup {
    /// Included in a validated ledger; the outcome is final.
    #[serde(rename_all = "camelCase")]
    Validated { result_code: String, ledger_index: u32 },
    /// Known to the node but not yet in a validated ledger.
    Pending,
    /// Unknown to the node.
    NotFound,
}

/// Outcome of a sign-and-submit call.
///
/// `engine_result` is the preliminary result; finality is determined later
/// by the issuance watcher via [`TxLookup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTx {
    pub tx_hash: String,
    pub engine_result: String,
    pub last_ledger_sequence: Option<u32>,
}

impl SubmittedTx {
    /// Whether the node accepted the transaction for relay.
    pub fn accepted(&self) -> bool {
        self.engine_result.starts_with("tes") || self.engine_result == "terQUEUED"
    }
}

/// A token payment from the issuing account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueTokenRequest {
    pub issuer: LedgerAddress,
    pub destination: LedgerAddress,
    pub currency: String,
    /// Decimal amount as a string.
    pub amount: String,
}

/// A trustline set from `account` toward `counterparty`.
///
/// With `authorize` set, the trustline is flagged as authorized, which is
/// how an issuer with RequireAuth approves a holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustlineRequest {
    pub account: LedgerAddress,
    pub counterparty: LedgerAddress,
    pub currency: String,
    pub limit: String,
    pub authorize: bool,
}
