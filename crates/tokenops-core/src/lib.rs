//! # tokenops-core: Foundational Types for TokenOps
//!
//! This crate is the leaf of the TokenOps dependency graph. It defines the
//! domain records that every other crate reads: assets, their typed ledger
//! controls, issuing addresses, and the identifiers that tie them together.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `AssetId`, `IssuingAddressId`,
//!    `IssuanceId`, `TemplateId`, `RequirementInstanceId`, `OrganizationId`.
//!    An issuance id cannot be passed where an asset id is expected.
//!
//! 2. **Typed ledger controls.** `AssetControls` is a tagged variant per
//!    ledger. A misspelled flag name fails deserialization instead of
//!    silently reading as `false`.
//!
//! 3. **Validated ledger addresses.** `LedgerAddress` checks the address
//!    shape for its ledger at construction.
//!
//! 4. **Requirement records as plain data.** Templates, instances, and
//!    applicability expressions live here so the store can persist them;
//!    evaluation lives in `tokenops-policy`.
//!
//! 5. **UTC-only timestamps** with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tokenops-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod asset;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod ledger;
pub mod requirement;
pub mod temporal;

pub use asset::{Asset, AssetClass, AssetControls, ComplianceMode, Registry};
pub use error::ValidationError;
pub use identity::{
    AssetId, IssuanceId, IssuingAddressId, OrganizationId, RequirementInstanceId, TemplateId,
};
pub use issuer::{IssuerStatus, IssuingAddress};
pub use ledger::{Ledger, LedgerAddress, Network};
pub use requirement::{
    Applicability, EnforcementLevel, Fact, Regime, RequirementInstance, RequirementStatus,
    RequirementTemplate,
};
pub use temporal::Timestamp;
