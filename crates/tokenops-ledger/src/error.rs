//! Ledger adapter error types.

use tokenops_core::Ledger;

/// Errors from ledger adapter calls.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// HTTP transport error after retries were exhausted.
    #[error("HTTP error calling {method}: {source}")]
    Http {
        method: String,
        source: reqwest::Error,
    },
    /// The node answered with a non-2xx status.
    #[error("ledger node returned {status} for {method}: {body}")]
    HttpStatus {
        method: String,
        status: u16,
        body: String,
    },
    /// The node answered with a JSON-RPC error.
    #[error("{method} failed with {code}: {message}")]
    Rpc {
        method: String,
        code: String,
        message: String,
    },
    /// The account does not exist on the ledger.
    #[error("account {address} not found on ledger")]
    AccountNotFound { address: String },
    /// Response body did not match the expected shape.
    #[error("failed to decode {method} response: {reason}")]
    Deserialization { method: String, reason: String },
    /// A submit was requested but no signing secret is configured.
    #[error("no issuer secret configured; cannot sign {operation}")]
    SigningUnavailable { operation: &'static str },
    /// The adapter does not support the operation on this ledger.
    #[error("{operation} is not supported on {ledger}")]
    Unsupported {
        ledger: Ledger,
        operation: &'static str,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl LedgerError {
    /// Whether the error is a transient transport or node failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
