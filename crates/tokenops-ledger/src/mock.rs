//! Scripted in-process ledger for tests.
//!
//! Accounts, transaction outcomes, and the validated ledger index are set up
//! front; failures can be injected per transaction or for the whole adapter.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use tokenops_core::{Ledger, LedgerAddress};

use crate::adapter::LedgerAdapter;
use crate::error::LedgerError;
use crate::flags::AccountFlags;
use crate::types::{
    AccountInfo, Balance, IssueTokenRequest, SubmittedTx, TrustLine, TrustlineRequest, TxLookup,
};

#[derive(Default)]
struct MockState {
    accounts: HashMap<String, AccountInfo>,
    lines: HashMap<String, Vec<TrustLine>>,
    balances: HashMap<String, Vec<Balance>>,
    txs: HashMap<String, TxLookup>,
    failing_txs: HashSet<String>,
    unavailable: bool,
    latest_validated: u32,
    submitted: Vec<SubmittedTx>,
}

/// A scripted [`LedgerAdapter`].
pub struct MockLedger {
    ledger: Ledger,
    state: RwLock<MockState>,
    calls: AtomicU32,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new(Ledger::Xrpl)
    }
}

impl MockLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            state: RwLock::new(MockState {
                latest_validated: 1,
                ..Default::default()
            }),
            calls: AtomicU32::new(0),
        }
    }

    /// Register an account with the given flags bitmask.
    pub fn with_account(self, address: &str, flags: u32) -> Self {
        self.state.write().accounts.insert(
            address.to_string(),
            AccountInfo {
                address: address.to_string(),
                flags: AccountFlags(flags),
                sequence: 1,
                balance: "100000000".to_string(),
                owner_count: 0,
            },
        );
        self
    }

    pub fn with_lines(self, address: &str, lines: Vec<TrustLine>) -> Self {
        self.state.write().lines.insert(address.to_string(), lines);
        self
    }

    pub fn with_balances(self, address: &str, balances: Vec<Balance>) -> Self {
        self.state.write().balances.insert(address.to_string(), balances);
        self
    }

    /// Script the lookup result for a transaction hash.
    pub fn set_tx(&self, tx_hash: &str, lookup: TxLookup) {
        self.state.write().txs.insert(tx_hash.to_string(), lookup);
    }

    /// Make lookups of one transaction fail with an RPC error.
    pub fn fail_tx(&self, tx_hash: &str) {
        self.state.write().failing_txs.insert(tx_hash.to_string());
    }

    /// Make every call fail as if the node were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    pub fn set_latest_validated(&self, index: u32) {
        self.state.write().latest_validated = index;
    }

    /// Transactions submitted through this adapter, oldest first.
    pub fn submitted(&self) -> Vec<SubmittedTx> {
        self.state.read().submitted.clone()
    }

    /// Number of trait calls made so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, method: &str) -> Result<(), LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.state.read().unavailable {
            return Err(LedgerError::Rpc {
                method: method.to_string(),
                code: "noNetwork".to_string(),
                message: "mock ledger unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn submit(&self, kind: &str) -> SubmittedTx {
        let mut state = self.state.write();
        let tx = SubmittedTx {
            tx_hash: format!("MOCK{kind}{:060}", state.submitted.len()),
            engine_result: "tesSUCCESS".to_string(),
            last_ledger_sequence: Some(state.latest_validated + 20),
        };
        state.txs.insert(tx.tx_hash.clone(), TxLookup::Pending);
        state.submitted.push(tx.clone());
        tx
    }
}

#[async_trait]
impl LedgerAdapter for MockLedger {
    fn ledger(&self) -> Ledger {
        self.ledger
    }

    async fn issue_token(&self, _request: &IssueTokenRequest) -> Result<SubmittedTx, LedgerError> {
        self.enter("submit")?;
        Ok(self.submit("PAY"))
    }

    async fn create_trustline(
        &self,
        _request: &TrustlineRequest,
    ) -> Result<SubmittedTx, LedgerError> {
        self.enter("submit")?;
        Ok(self.submit("TRUST"))
    }

    async fn get_balances(&self, issuer: &LedgerAddress) -> Result<Vec<Balance>, LedgerError> {
        self.enter("gateway_balances")?;
        Ok(self
            .state
            .read()
            .balances
            .get(issuer.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn get_account_lines(
        &self,
        account: &LedgerAddress,
    ) -> Result<Vec<TrustLine>, LedgerError> {
        self.enter("account_lines")?;
        Ok(self
            .state
            .read()
            .lines
            .get(account.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn account_info(&self, address: &LedgerAddress) -> Result<AccountInfo, LedgerError> {
        self.enter("account_info")?;
        self.state
            .read()
            .accounts
            .get(address.as_str())
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound {
                address: address.to_string(),
            })
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TxLookup, LedgerError> {
        self.enter("tx")?;
        let state = self.state.read();
        if state.failing_txs.contains(tx_hash) {
            return Err(LedgerError::Rpc {
                method: "tx".to_string(),
                code: "internal".to_string(),
                message: format!("scripted failure for {tx_hash}"),
            });
        }
        Ok(state.txs.get(tx_hash).cloned().unwrap_or(TxLookup::NotFound))
    }

    async fn latest_validated_ledger(&self) -> Result<u32, LedgerError> {
        self.enter("ledger")?;
        Ok(self.state.read().latest_validated)
    }
}
