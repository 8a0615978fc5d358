//! # Asset Readiness
//!
//! Evaluates whether an asset is ready for issuance.
//!
//! ## Rules
//!
//! Rules run in order and every failing rule contributes a blocker:
//!
//! 1. Asset missing: a single `ASSET_NOT_FOUND` blocker and an empty
//!    fact snapshot. No other rule runs.
//! 2. No linked issuing address, or its status is not `APPROVED`:
//!    `ISSUER_NOT_APPROVED`.
//! 3. Control rules from [`CONTROL_RULES`]: for a given ledger and
//!    compliance mode, a required control flag must be set.
//!
//! `ok` is true iff no blocker was produced. The verdict is a pure function
//! of the asset and its issuing address.

use serde::{Serialize, Serializer};

use tokenops_core::{
    Asset, AssetClass, AssetControls, AssetId, ComplianceMode, IssuingAddress, Ledger, Registry,
};
use tokenops_store::{Store, StoreError};

use crate::blocker::ReadinessBlocker;

/// The stored facts readiness is computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFacts {
    pub asset: Asset,
    /// The linked issuing address, if the link resolves.
    pub issuing_address: Option<IssuingAddress>,
}

impl AssetFacts {
    pub fn issuer_approved(&self) -> bool {
        self.issuing_address
            .as_ref()
            .is_some_and(IssuingAddress::is_approved)
    }
}

/// Snapshot of the facts a verdict was computed from, for audit display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessFacts {
    pub asset_id: AssetId,
    pub asset_class: AssetClass,
    pub ledger: Ledger,
    pub compliance_mode: ComplianceMode,
    pub issuer_approved: bool,
    pub registry: Registry,
}

/// Readiness verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessResult {
    pub ok: bool,
    pub blockers: Vec<ReadinessBlocker>,
    /// `None` when the asset does not exist; serialized as `{}`.
    #[serde(serialize_with = "facts_or_empty")]
    pub facts: Option<ReadinessFacts>,
}

impl ReadinessResult {
    pub fn has_blocker(&self, code: crate::blocker::BlockerCode) -> bool {
        self.blockers.iter().any(|b| b.code == code)
    }
}

fn facts_or_empty<S: Serializer>(facts: &Option<ReadinessFacts>, s: S) -> Result<S::Ok, S::Error> {
    match facts {
        Some(f) => f.serialize(s),
        None => serde_json::Map::new().serialize(s),
    }
}

/// A ledger/mode-specific control requirement.
pub struct ControlRule {
    pub ledger: Ledger,
    pub mode: ComplianceMode,
    pub satisfied: fn(&AssetControls) -> bool,
    pub blocker: fn() -> ReadinessBlocker,
}

/// Control rules, evaluated in order after the issuer rule.
pub static CONTROL_RULES: &[ControlRule] = &[
    ControlRule {
        ledger: Ledger::Xrpl,
        mode: ComplianceMode::GatedBefore,
        satisfied: AssetControls::require_auth,
        blocker: ReadinessBlocker::xrpl_require_auth_disabled,
    },
    ControlRule {
        ledger: Ledger::Evm,
        mode: ComplianceMode::GatedBefore,
        satisfied: AssetControls::allowlist_enabled,
        blocker: ReadinessBlocker::evm_allowlist_disabled,
    },
];

/// Evaluate readiness from already-loaded facts.
pub fn evaluate_readiness(facts: Option<&AssetFacts>) -> ReadinessResult {
    let Some(facts) = facts else {
        return ReadinessResult {
            ok: false,
            blockers: vec![ReadinessBlocker::asset_not_found()],
            facts: None,
        };
    };
    let asset = &facts.asset;
    let issuer_approved = facts.issuer_approved();

    let mut blockers = Vec::new();
    if !issuer_approved {
        blockers.push(ReadinessBlocker::issuer_not_approved());
    }
    for rule in CONTROL_RULES {
        if rule.ledger == asset.ledger
            && rule.mode == asset.compliance_mode
            && !(rule.satisfied)(&asset.controls)
        {
            blockers.push((rule.blocker)());
        }
    }

    ReadinessResult {
        ok: blockers.is_empty(),
        blockers,
        facts: Some(ReadinessFacts {
            asset_id: asset.id,
            asset_class: asset.asset_class,
            ledger: asset.ledger,
            compliance_mode: asset.compliance_mode,
            issuer_approved,
            registry: asset.registry.clone(),
        }),
    }
}

/// Load an asset and its issuing address, then evaluate readiness.
///
/// A missing asset is a blocker; a store failure is an error.
pub async fn compute_asset_readiness(
    store: &dyn Store,
    asset_id: AssetId,
) -> Result<ReadinessResult, StoreError> {
    let facts = load_asset_facts(store, asset_id).await?;
    let result = evaluate_readiness(facts.as_ref());
    tracing::debug!(
        asset_id = %asset_id,
        ok = result.ok,
        blockers = result.blockers.len(),
        "asset readiness evaluated"
    );
    Ok(result)
}

/// Resolve an asset and its linked issuing address.
pub async fn load_asset_facts(
    store: &dyn Store,
    asset_id: AssetId,
) -> Result<Option<AssetFacts>, StoreError> {
    let Some(asset) = store.get_asset(asset_id).await? else {
        return Ok(None);
    };
    let issuing_address = match asset.issuing_address_id {
        Some(id) => {
            let address = store.get_issuing_address(id).await?;
            if address.is_none() {
                tracing::warn!(
                    asset_id = %asset_id,
                    issuing_address_id = %id,
                    "asset links an issuing address that does not exist"
                );
            }
            address
        }
        None => None,
    };
    Ok(Some(AssetFacts {
        asset,
        issuing_address,
    }))
}
