//! YAML fixtures for seeding a [`MemoryStore`](crate::MemoryStore).
//!
//! ```yaml
//! issuingAddresses:
//!   - id: 7d0c1a4e-3f55-4c1e-9d1b-6a2f0c9e8b11
//!     organizationId: 2b7e6f9a-0f4c-4f55-8a10-3c5d2e1f0a99
//!     address: rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh
//!     ledger: XRPL
//!     network: TESTNET
//!     status: APPROVED
//! assets:
//!   - id: 5a1d0c7e-9b2f-4e3a-8c6d-1f0e2d3c4b5a
//!     organizationId: 2b7e6f9a-0f4c-4f55-8a10-3c5d2e1f0a99
//!     code: USD
//!     name: Acme Dollar
//!     ledger: XRPL
//!     complianceMode: GATED_BEFORE
//!     assetClass: STABLECOIN
//!     controls: { ledger: XRPL, requireAuth: true }
//!     issuingAddressId: 7d0c1a4e-3f55-4c1e-9d1b-6a2f0c9e8b11
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use tokenops_core::{Asset, IssuingAddress, RequirementInstance, RequirementTemplate};
use tokenops_state::Issuance;

use crate::error::StoreError;

/// Records to seed a store with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Fixtures {
    #[serde(default)]
    pub issuing_addresses: Vec<IssuingAddress>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub templates: Vec<RequirementTemplate>,
    #[serde(default)]
    pub requirement_instances: Vec<RequirementInstance>,
    #[serde(default)]
    pub issuances: Vec<Issuance>,
}

impl Fixtures {
    pub fn from_yaml_str(raw: &str) -> Result<Self, StoreError> {
        serde_yaml::from_str(raw).map_err(|e| StoreError::Fixture(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Fixture(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&raw)
    }
}
