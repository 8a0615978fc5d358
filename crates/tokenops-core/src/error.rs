//! # Validation Errors
//!
//! Errors raised when constructing domain values from untrusted input
//! (database rows, fixture files, CLI arguments). All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.

use thiserror::Error;

use crate::ledger::Ledger;

/// A domain value failed validation at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A ledger address does not match the expected shape for its ledger.
    #[error("invalid {ledger} address {address:?}: {reason}")]
    InvalidAddress {
        /// Ledger the address was validated against.
        ledger: Ledger,
        /// The rejected address.
        address: String,
        /// Why the address was rejected.
        reason: String,
    },

    /// The controls variant on an asset does not belong to the asset's ledger.
    #[error("asset on {ledger} cannot carry {controls} controls")]
    ControlsLedgerMismatch {
        /// The asset's ledger.
        ledger: Ledger,
        /// The ledger the controls variant belongs to.
        controls: Ledger,
    },

    /// An enum string did not match any known variant.
    #[error("unknown {kind}: {value:?}")]
    UnknownVariant {
        /// The enum being parsed (e.g. "ledger", "compliance mode").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A required text field was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the empty field.
        field: &'static str,
    },

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },
}
