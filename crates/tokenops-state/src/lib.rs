//! # tokenops-state: Issuance Lifecycle
//!
//! An issuance is a ledger transaction that creates or distributes tokens.
//! It is recorded as `SUBMITTED` when the transaction is sent and moves to a
//! terminal state once the ledger has a final answer:
//!
//! ```text
//! SUBMITTED ──▶ CONFIRMED   (validated, tesSUCCESS)
//!     │
//!     └──────▶ FAILED       (validated with another result, or expired)
//! ```
//!
//! Both `CONFIRMED` and `FAILED` are terminal. Transition methods on a
//! terminal issuance return [`IssuanceError::TerminalState`] and leave the
//! record untouched.

pub mod issuance;

pub use issuance::{
    Issuance, IssuanceError, IssuanceStatus, IssuanceTransition,
    EXPIRED_REASON, TES_SUCCESS,
};
