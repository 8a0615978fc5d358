//! # Ledger Adapter Trait
//!
//! Abstracts over the ledger node TokenOps talks to. Every method is async
//! and the trait is object-safe so adapters are shared as
//! `Arc<dyn LedgerAdapter>` between the CLI, the checker, and the watcher.

use async_trait::async_trait;

use tokenops_core::{Ledger, LedgerAddress};

use crate::error::LedgerError;
use crate::types::{
    AccountInfo, Balance, IssueTokenRequest, SubmittedTx, TrustLine, TrustlineRequest, TxLookup,
};

/// Operations TokenOps needs from a ledger.
#[async_trait]
pub trait LedgerAdapter: Send + Sync {
    /// The ledger this adapter talks to.
    fn ledger(&self) -> Ledger;

    /// Send `amount` of `currency` from the issuer to the destination.
    async fn issue_token(&self, request: &IssueTokenRequest) -> Result<SubmittedTx, LedgerError>;

    /// Create or update a trustline.
    async fn create_trustline(
        &self,
        request: &TrustlineRequest,
    ) -> Result<SubmittedTx, LedgerError>;

    /// Outstanding obligations of an issuing account, per currency.
    async fn get_balances(&self, issuer: &LedgerAddress) -> Result<Vec<Balance>, LedgerError>;

    /// All trustlines of an account.
    async fn get_account_lines(
        &self,
        account: &LedgerAddress,
    ) -> Result<Vec<TrustLine>, LedgerError>;

    /// Account root data, including the flags bitmask.
    async fn account_info(&self, address: &LedgerAddress) -> Result<AccountInfo, LedgerError>;

    /// Look up a transaction by hash.
    async fn transaction_status(&self, tx_hash: &str) -> Result<TxLookup, LedgerError>;

    /// Index of the most recent validated ledger.
    async fn latest_validated_ledger(&self) -> Result<u32, LedgerError>;
}
