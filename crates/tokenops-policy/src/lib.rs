//! # tokenops-policy: Readiness and Compliance Gating
//!
//! Decides whether an asset may be issued, and which regulatory
//! requirements apply to it.
//!
//! ## Components
//!
//! - **Readiness** (`readiness.rs`): an ordered, accumulate-all rule table
//!   producing [`ReadinessResult`] with named [`ReadinessBlocker`]s.
//!   [`evaluate_readiness`] is pure; [`compute_asset_readiness`] loads the
//!   facts from a store first.
//!
//! - **RequireAuth** (`require_auth.rs`): reads the issuing account's flags
//!   through a ledger adapter. Adapter failures are reported in the result,
//!   never raised.
//!
//! - **Policy kernel** (`kernel/`): maps a [`FactBag`] to applicable
//!   requirement templates, a rationale, and an [`EnforcementPlan`];
//!   persists matched templates as requirement instances idempotently.
//!
//! ## Error model
//!
//! Business-rule failures are data (blockers, rationale entries). Only
//! store failures and catalog validation surface as `Err`.

pub mod blocker;
pub mod kernel;
pub mod readiness;
pub mod require_auth;

pub use blocker::{BlockerCode, ReadinessBlocker};
pub use kernel::{
    create_requirement_instances, enforcement_plan_for_asset, evaluate_facts, Catalog,
    CatalogError, DistributionType, DraftInstance, EnforcementPlan, FactBag, InstanceSync,
    InvestorAudience, KernelEvaluation, PlanStep, RationaleEntry, TransferType,
};
pub use readiness::{
    compute_asset_readiness, evaluate_readiness, AssetFacts, ReadinessFacts, ReadinessResult,
};
pub use require_auth::{
    check_require_auth, validate_asset_require_auth, RequireAuthCheck, RequireAuthValidation,
};
