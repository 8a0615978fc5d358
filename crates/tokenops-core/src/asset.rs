//! # Assets
//!
//! A tokenizable instrument issued on one ledger by one organization.
//!
//! ## Typed controls
//!
//! Ledger-level controls are a tagged variant per ledger rather than an
//! open key/value map:
//!
//! ```json
//! { "ledger": "XRPL", "requireAuth": true, "freezeEnabled": false }
//! ```
//!
//! Unknown keys are rejected (`"requireAuht"` is an error, not `false`),
//! and an asset cannot carry controls belonging to a different ledger.
//!
//! The registry stays an open map: it is audit data displayed to users,
//! never an input to a decision.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{AssetId, IssuingAddressId, OrganizationId};
use crate::ledger::Ledger;
use crate::temporal::Timestamp;

// ─── Compliance mode ─────────────────────────────────────────────────

/// How compliance gates relate to issuance for an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceMode {
    /// Holders must be authorized before they can receive the asset.
    GatedBefore,
    /// Transfers are recorded for audit but not gated.
    RecordOnly,
}

impl ComplianceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GatedBefore => "GATED_BEFORE",
            Self::RecordOnly => "RECORD_ONLY",
        }
    }
}

impl std::fmt::Display for ComplianceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GATED_BEFORE" => Ok(Self::GatedBefore),
            "RECORD_ONLY" => Ok(Self::RecordOnly),
            other => Err(ValidationError::UnknownVariant {
                kind: "compliance mode",
                value: other.to_string(),
            }),
        }
    }
}

// ─── Asset class ─────────────────────────────────────────────────────

/// Economic classification of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    /// Fiat-referenced stable value token.
    Stablecoin,
    /// Tokenized share or equity interest.
    Equity,
    /// Tokenized bond, note, or other debt instrument.
    Debt,
    /// Units of a collective investment fund.
    Fund,
    RealEstate,
    Commodity,
    /// Access or consumption token with no investment character.
    Utility,
}

impl AssetClass {
    /// All classes, in declaration order.
    pub fn all() -> &'static [AssetClass] {
        &[
            Self::Stablecoin,
            Self::Equity,
            Self::Debt,
            Self::Fund,
            Self::RealEstate,
            Self::Commodity,
            Self::Utility,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stablecoin => "STABLECOIN",
            Self::Equity => "EQUITY",
            Self::Debt => "DEBT",
            Self::Fund => "FUND",
            Self::RealEstate => "REAL_ESTATE",
            Self::Commodity => "COMMODITY",
            Self::Utility => "UTILITY",
        }
    }

    /// Whether the class is a security-like instrument.
    pub fn is_security(&self) -> bool {
        matches!(self, Self::Equity | Self::Debt | Self::Fund | Self::RealEstate)
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownVariant {
                kind: "asset class",
                value: s.to_string(),
            })
    }
}

// ─── Controls ────────────────────────────────────────────────────────

/// XRPL account-level controls configured for an asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct XrplControls {
    /// Holders need an authorized trustline before receiving the asset.
    #[serde(default)]
    pub require_auth: bool,
    /// The issuer may freeze individual trustlines.
    #[serde(default)]
    pub freeze_enabled: bool,
    /// The issuer may claw back issued tokens.
    #[serde(default)]
    pub clawback_enabled: bool,
}

/// EVM contract-level controls configured for an asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EvmControls {
    /// Transfers are restricted to allowlisted holders.
    #[serde(default)]
    pub allowlist_enabled: bool,
    #[serde(default)]
    pub pausable: bool,
}

/// Ledger controls, tagged by the ledger they apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ledger", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetControls {
    Xrpl(XrplControls),
    Evm(EvmControls),
}

impl AssetControls {
    /// All-off controls for `ledger`.
    pub fn default_for(ledger: Ledger) -> Self {
        match ledger {
            Ledger::Xrpl => Self::Xrpl(XrplControls::default()),
            Ledger::Evm => Self::Evm(EvmControls::default()),
        }
    }

    /// The ledger this controls variant belongs to.
    pub fn ledger(&self) -> Ledger {
        match self {
            Self::Xrpl(_) => Ledger::Xrpl,
            Self::Evm(_) => Ledger::Evm,
        }
    }

    /// `requireAuth` for XRPL controls; `false` on any other ledger.
    pub fn require_auth(&self) -> bool {
        match self {
            Self::Xrpl(c) => c.require_auth,
            Self::Evm(_) => false,
        }
    }

    /// `allowlistEnabled` for EVM controls; `false` on any other ledger.
    pub fn allowlist_enabled(&self) -> bool {
        match self {
            Self::Evm(c) => c.allowlist_enabled,
            Self::Xrpl(_) => false,
        }
    }
}

// ─── Registry ────────────────────────────────────────────────────────

/// Current registry schema version.
pub const REGISTRY_SCHEMA_VERSION: u32 = 1;

/// Free-form registry data (ISIN, prospectus links, legal wrapper, …).
///
/// Carried through to readiness snapshots verbatim for audit display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default = "default_registry_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, serde_json::Value>,
}

fn default_registry_version() -> u32 {
    REGISTRY_SCHEMA_VERSION
}

impl Registry {
    pub fn new() -> Self {
        Self {
            schema_version: REGISTRY_SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Asset ───────────────────────────────────────────────────────────

/// A tokenizable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawAsset")]
pub struct Asset {
    pub id: AssetId,
    pub organization_id: OrganizationId,
    /// Ledger currency code (e.g. `"USD"` or a 40-hex XRPL currency).
    pub code: String,
    pub name: String,
    pub ledger: Ledger,
    pub compliance_mode: ComplianceMode,
    pub asset_class: AssetClass,
    pub registry: Registry,
    pub controls: AssetControls,
    pub issuing_address_id: Option<IssuingAddressId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Asset {
    /// Create an asset with all-off controls and no issuing address.
    pub fn new(
        organization_id: OrganizationId,
        code: impl Into<String>,
        name: impl Into<String>,
        ledger: Ledger,
        compliance_mode: ComplianceMode,
        asset_class: AssetClass,
    ) -> Result<Self, ValidationError> {
        let code = code.into();
        let name = name.into();
        if code.trim().is_empty() {
            return Err(ValidationError::Empty { field: "code" });
        }
        if name.trim().is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        let now = Timestamp::now();
        Ok(Self {
            id: AssetId::new(),
            organization_id,
            code,
            name,
            ledger,
            compliance_mode,
            asset_class,
            registry: Registry::new(),
            controls: AssetControls::default_for(ledger),
            issuing_address_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the controls, rejecting a variant for another ledger.
    pub fn set_controls(&mut self, controls: AssetControls) -> Result<(), ValidationError> {
        if controls.ledger() != self.ledger {
            return Err(ValidationError::ControlsLedgerMismatch {
                ledger: self.ledger,
                controls: controls.ledger(),
            });
        }
        self.controls = controls;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Builder-style [`Asset::set_controls`].
    pub fn with_controls(mut self, controls: AssetControls) -> Result<Self, ValidationError> {
        self.set_controls(controls)?;
        Ok(self)
    }

    pub fn with_issuing_address(mut self, id: IssuingAddressId) -> Self {
        self.issuing_address_id = Some(id);
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAsset {
    id: AssetId,
    organization_id: OrganizationId,
    code: String,
    name: String,
    ledger: Ledger,
    compliance_mode: ComplianceMode,
    asset_class: AssetClass,
    #[serde(default)]
    registry: Registry,
    controls: Option<AssetControls>,
    #[serde(default)]
    issuing_address_id: Option<IssuingAddressId>,
    #[serde(default = "Timestamp::now")]
    created_at: Timestamp,
    #[serde(default = "Timestamp::now")]
    updated_at: Timestamp,
}

impl TryFrom<RawAsset> for Asset {
    type Error = ValidationError;

    fn try_from(raw: RawAsset) -> Result<Self, Self::Error> {
        let controls = raw
            .controls
            .unwrap_or_else(|| AssetControls::default_for(raw.ledger));
        if controls.ledger() != raw.ledger {
            return Err(ValidationError::ControlsLedgerMismatch {
                ledger: raw.ledger,
                controls: controls.ledger(),
            });
        }
        if raw.code.trim().is_empty() {
            return Err(ValidationError::Empty { field: "code" });
        }
        if raw.name.trim().is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        Ok(Self {
            id: raw.id,
            organization_id: raw.organization_id,
            code: raw.code,
            name: raw.name,
            ledger: raw.ledger,
            compliance_mode: raw.compliance_mode,
            asset_class: raw.asset_class,
            registry: raw.registry,
            controls,
            issuing_address_id: raw.issuing_address_id,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}
