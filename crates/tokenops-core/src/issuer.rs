//! # Issuing Addresses
//!
//! A ledger account designated to issue an asset's tokens. Approval is set
//! by an external approval workflow; TokenOps only reads the status.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{IssuingAddressId, OrganizationId};
use crate::ledger::{Ledger, LedgerAddress, Network};
use crate::temporal::Timestamp;

/// Approval status of an issuing address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuerStatus {
    Pending,
    Approved,
    Rejected,
}

impl IssuerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Only an approved address may issue.
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl std::fmt::Display for IssuerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssuerStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(ValidationError::UnknownVariant {
                kind: "issuer status",
                value: other.to_string(),
            }),
        }
    }
}

/// A ledger account designated to issue tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawIssuingAddress")]
pub struct IssuingAddress {
    pub id: IssuingAddressId,
    pub organization_id: OrganizationId,
    pub address: LedgerAddress,
    pub ledger: Ledger,
    pub network: Network,
    pub status: IssuerStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl IssuingAddress {
    /// Register a new address in `PENDING` status.
    pub fn new(
        organization_id: OrganizationId,
        ledger: Ledger,
        network: Network,
        address: &str,
    ) -> Result<Self, ValidationError> {
        let now = Timestamp::now();
        Ok(Self {
            id: IssuingAddressId::new(),
            organization_id,
            address: LedgerAddress::parse(ledger, address)?,
            ledger,
            network,
            status: IssuerStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Builder-style status override, used by fixtures and tests.
    pub fn with_status(mut self, status: IssuerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_approved(&self) -> bool {
        self.status.is_approved()
    }
}

/// Unvalidated wire form; the address is checked against `ledger`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIssuingAddress {
    id: IssuingAddressId,
    organization_id: OrganizationId,
    address: String,
    ledger: Ledger,
    network: Network,
    status: IssuerStatus,
    #[serde(default = "Timestamp::now")]
    created_at: Timestamp,
    #[serde(default = "Timestamp::now")]
    updated_at: Timestamp,
}

impl TryFrom<RawIssuingAddress> for IssuingAddress {
    type Error = ValidationError;

    fn try_from(raw: RawIssuingAddress) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            organization_id: raw.organization_id,
            address: LedgerAddress::parse(raw.ledger, &raw.address)?,
            ledger: raw.ledger,
            network: raw.network,
            status: raw.status,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    #[test]
    fn test_new_address_starts_pending() {
        let issuer =
            IssuingAddress::new(OrganizationId::new(), Ledger::Xrpl, Network::Testnet, ADDR)
                .unwrap();
        assert_eq!(issuer.status, IssuerStatus::Pending);
        assert!(!issuer.is_approved());
    }

    #[test]
    fn test_with_status_approves() {
        let issuer =
            IssuingAddress::new(OrganizationId::new(), Ledger::Xrpl, Network::Testnet, ADDR)
                .unwrap()
                .with_status(IssuerStatus::Approved);
        assert!(issuer.is_approved());
    }

    #[test]
    fn test_deserialize_validates_address_against_ledger() {
        let json = serde_json::json!({
            "id": IssuingAddressId::new(),
            "organizationId": OrganizationId::new(),
            "address": ADDR,
            "ledger": "EVM",
            "network": "MAINNET",
            "status": "APPROVED",
            "createdAt": "2026-01-15T12:00:00Z",
            "updatedAt": "2026-01-15T12:00:00Z",
        });
        let err = serde_json::from_value::<IssuingAddress>(json).unwrap_err();
        assert!(err.to_string().contains("EVM"), "got: {err}");
    }

    #[test]
    fn test_serde_roundtrip_preserves_status() {
        let issuer =
            IssuingAddress::new(OrganizationId::new(), Ledger::Xrpl, Network::Mainnet, ADDR)
                .unwrap()
                .with_status(IssuerStatus::Rejected);
        let json = serde_json::to_value(&issuer).unwrap();
        assert_eq!(json["status"], "REJECTED");
        let back: IssuingAddress = serde_json::from_value(json).unwrap();
        assert_eq!(back, issuer);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("APPROVED".parse::<IssuerStatus>().unwrap(), IssuerStatus::Approved);
        assert!("approved".parse::<IssuerStatus>().is_err());
    }
}
