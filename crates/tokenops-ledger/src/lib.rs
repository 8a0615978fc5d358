//! # tokenops-ledger: Ledger Adapters
//!
//! The [`LedgerAdapter`] trait is the only suspending boundary in TokenOps:
//! the readiness checker reads account flags through it and the issuance
//! watcher looks up transaction outcomes through it.
//!
//! ## Implementations
//!
//! - [`XrplJsonRpcAdapter`]: talks to an XRPL node over JSON-RPC
//!   (`account_info`, `account_lines`, `gateway_balances`, `tx`, `ledger`,
//!   and sign-and-submit `submit`). Transport failures are retried with
//!   exponential backoff (200ms, 400ms, 800ms).
//! - `MockLedger` (feature `mock`): a scripted in-process adapter for tests.
//!
//! ## Crate Policy
//!
//! - Depends on `tokenops-core` for `Ledger` and `LedgerAddress` only.
//! - Adapters are `Send + Sync` and shared as `Arc<dyn LedgerAdapter>`.

pub mod adapter;
pub mod config;
pub mod error;
pub mod flags;
#[cfg(feature = "mock")]
pub mod mock;
pub(crate) mod retry;
pub mod types;
pub mod xrpl;

pub use adapter::LedgerAdapter;
pub use config::{ConfigError, XrplConfig};
pub use error::LedgerError;
pub use flags::AccountFlags;
#[cfg(feature = "mock")]
pub use mock::MockLedger;
pub use types::{
    AccountInfo, Balance, IssueTokenRequest, SubmittedTx, TrustLine, TrustlineRequest, TxLookup,
};
pub use xrpl::XrplJsonRpcAdapter;
