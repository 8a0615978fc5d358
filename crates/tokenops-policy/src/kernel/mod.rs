//! # Policy Kernel
//!
//! Maps a [`FactBag`] to the regulatory requirements that apply to an asset.
//!
//! ```text
//!   FactBag ──▶ evaluate_facts(catalog) ──▶ KernelEvaluation
//!                                            ├── requirementInstances (PENDING drafts)
//!                                            ├── rationale
//!                                            └── enforcementPlan
//!                                                 ├── beforeIssuance
//!                                                 ├── beforeTransfer
//!                                                 └── advisory
//! ```
//!
//! [`create_requirement_instances`] persists the drafts for a stored asset,
//! at most one instance per `(asset, template)`.

pub mod applicability;
pub mod catalog;
pub mod evaluation;
pub mod facts;
pub mod instances;
pub mod plan;

pub use catalog::{Catalog, CatalogError};
pub use evaluation::{evaluate_facts, DraftInstance, KernelEvaluation, RationaleEntry};
pub use facts::{DistributionType, FactBag, FactValue, InvestorAudience, TransferType};
pub use instances::{create_requirement_instances, enforcement_plan_for_asset, InstanceSync};
pub use plan::{EnforcementPlan, PlanStep};
