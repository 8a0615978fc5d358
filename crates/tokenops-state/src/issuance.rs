//! # Issuance Records and Transitions
//!
//! [`Issuance`] is the persisted record of one submitted ledger transaction.
//! Only the issuance watcher mutates it, and only through
//! [`Issuance::confirm`] and [`Issuance::fail`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tokenops_core::{AssetId, IssuanceId, Timestamp, ValidationError};

/// XRPL engine result code for a successful transaction.
pub const TES_SUCCESS: &str = "tesSUCCESS";

/// Failure reason recorded when a transaction can no longer be validated.
pub const EXPIRED_REASON: &str = "EXPIRED";

// ─── Issuance Status ─────────────────────────────────────────────────

/// The lifecycle state of an issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuanceStatus {
    /// Sent to the ledger, outcome not yet known.
    Submitted,
    /// Validated with `tesSUCCESS` (terminal).
    Confirmed,
    /// Validated with a failure result, or expired (terminal).
    Failed,
}

impl IssuanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Confirmed => "CONFIRMED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

impl std::fmt::Display for IssuanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssuanceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMITTED" => Ok(Self::Submitted),
            "CONFIRMED" => Ok(Self::Confirmed),
            "FAILED" => Ok(Self::Failed),
            other => Err(ValidationError::UnknownVariant {
                kind: "issuance status",
                value: other.to_string(),
            }),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by issuance construction and transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    /// The issuance already reached a terminal state.
    #[error("issuance {id} is in terminal state {state}")]
    TerminalState { id: IssuanceId, state: IssuanceStatus },

    /// Amount is not a positive decimal string.
    #[error("invalid issuance amount {0:?}")]
    InvalidAmount(String),

    /// Transaction hash is empty.
    #[error("issuance transaction hash must not be empty")]
    MissingTxHash,
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of one issuance state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceTransition {
    pub issuance_id: IssuanceId,
    pub from_status: IssuanceStatus,
    pub to_status: IssuanceStatus,
    pub timestamp: Timestamp,
    /// Ledger result code or failure reason.
    pub reason: String,
}

// ─── Issuance ────────────────────────────────────────────────────────

/// A submitted token issuance tracked to ledger finality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuance {
    pub id: IssuanceId,
    pub asset_id: AssetId,
    /// Decimal amount as a string; ledger amounts exceed f64 precision.
    pub amount: String,
    pub destination: String,
    pub tx_hash: String,
    /// Last ledger in which the transaction may be validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ledger_sequence: Option<u32>,
    pub status: IssuanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default = "Timestamp::now")]
    pub submitted_at: Timestamp,
    #[serde(default = "Timestamp::now")]
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<Timestamp>,
}

impl Issuance {
    /// Record a freshly submitted transaction.
    pub fn submitted(
        asset_id: AssetId,
        amount: impl Into<String>,
        destination: impl Into<String>,
        tx_hash: impl Into<String>,
        last_ledger_sequence: Option<u32>,
    ) -> Result<Self, IssuanceError> {
        let amount = amount.into();
        if !is_positive_decimal(&amount) {
            return Err(IssuanceError::InvalidAmount(amount));
        }
        let tx_hash = tx_hash.into();
        if tx_hash.trim().is_empty() {
            return Err(IssuanceError::MissingTxHash);
        }
        let now = Timestamp::now();
        Ok(Self {
            id: IssuanceId::new(),
            asset_id,
            amount,
            destination: destination.into(),
            tx_hash,
            last_ledger_sequence,
            status: IssuanceStatus::Submitted,
            result_code: None,
            ledger_index: None,
            failure_reason: None,
            submitted_at: now,
            updated_at: now,
            finalized_at: None,
        })
    }

    /// SUBMITTED → CONFIRMED.
    pub fn confirm(
        &mut self,
        result_code: impl Into<String>,
        ledger_index: Option<u32>,
    ) -> Result<IssuanceTransition, IssuanceError> {
        self.require_open()?;
        let result_code = result_code.into();
        self.result_code = Some(result_code.clone());
        self.ledger_index = ledger_index;
        Ok(self.finalize(IssuanceStatus::Confirmed, result_code))
    }

    /// SUBMITTED → FAILED.
    ///
    /// `result_code` is the ledger's result when the transaction was
    /// validated; it is `None` for expiry. `reason` defaults to the result
    /// code when not given.
    pub fn fail(
        &mut self,
        result_code: Option<String>,
        ledger_index: Option<u32>,
        reason: Option<String>,
    ) -> Result<IssuanceTransition, IssuanceError> {
        self.require_open()?;
        let reason = reason
            .or_else(|| result_code.clone())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        self.result_code = result_code;
        self.ledger_index = ledger_index;
        self.failure_reason = Some(reason.clone());
        Ok(self.finalize(IssuanceStatus::Failed, reason))
    }

    /// SUBMITTED → FAILED with reason `EXPIRED`.
    pub fn expire(&mut self) -> Result<IssuanceTransition, IssuanceError> {
        self.fail(None, None, Some(EXPIRED_REASON.to_string()))
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether `latest_validated` is past the transaction's last valid ledger.
    ///
    /// Always `false` when no `lastLedgerSequence` was recorded.
    pub fn is_expired_at(&self, latest_validated: u32) -> bool {
        self.last_ledger_sequence
            .is_some_and(|last| latest_validated > last)
    }

    fn require_open(&self) -> Result<(), IssuanceError> {
        if self.status.is_terminal() {
            return Err(IssuanceError::TerminalState {
                id: self.id,
                state: self.status,
            });
        }
        Ok(())
    }

    fn finalize(&mut self, to: IssuanceStatus, reason: String) -> IssuanceTransition {
        let now = Timestamp::now();
        let transition = IssuanceTransition {
            issuance_id: self.id,
            from_status: self.status,
            to_status: to,
            timestamp: now,
            reason,
        };
        self.status = to;
        self.updated_at = now;
        self.finalized_at = Some(now);
        transition
    }
}

fn is_positive_decimal(s: &str) -> bool {
    let mut parts = s.splitn(2, '.');
    let int = parts.next().unwrap_or("");
    let frac = parts.next();
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    let well_formed = match frac {
        Some(f) => digits(int) && digits(f),
        None => digits(int),
    };
    well_formed && s.bytes().any(|b| matches!(b, b'1'..=b'9'))
}

// ─── Tests ───────────────────────────────────────────────────────────
