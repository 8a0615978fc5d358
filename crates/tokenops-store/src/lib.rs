//! # tokenops-store: Persistence
//!
//! The [`Store`] trait is the one persistence seam in TokenOps. The
//! readiness evaluator and the policy kernel read through it; the issuance
//! watcher reads and conditionally updates issuances through it.
//!
//! ## Implementations
//!
//! - [`MemoryStore`]: `parking_lot::RwLock`-guarded maps, optionally seeded
//!   from a YAML fixture file. Used when `DATABASE_URL` is unset and in
//!   tests.
//! - [`PgStore`]: PostgreSQL via `sqlx`, with embedded migrations.
//!
//! ## Idempotency
//!
//! - Requirement instances are unique per `(asset_id, template_id)`;
//!   inserting a duplicate is a no-op reporting `false`.
//! - Issuance updates only apply while the stored row is still
//!   `SUBMITTED`, so a watcher run that lost a race writes nothing.

pub mod error;
pub mod fixtures;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use tokenops_core::{
    Asset, AssetId, IssuanceId, IssuingAddress, IssuingAddressId, OrganizationId,
    RequirementInstance, RequirementInstanceId, RequirementStatus, RequirementTemplate,
    TemplateId,
};
use tokenops_state::{Issuance, IssuanceStatus};

pub use error::StoreError;
pub use fixtures::Fixtures;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistent records used by TokenOps.
#[async_trait]
pub trait Store: Send + Sync {
    // -- Assets and issuing addresses ----------------------------------------

    async fn get_asset(&self, id: AssetId) -> Result<Option<Asset>, StoreError>;

    /// Assets, optionally restricted to one organization, oldest first.
    async fn list_assets(
        &self,
        organization: Option<OrganizationId>,
    ) -> Result<Vec<Asset>, StoreError>;

    async fn insert_asset(&self, asset: &Asset) -> Result<(), StoreError>;

    async fn get_issuing_address(
        &self,
        id: IssuingAddressId,
    ) -> Result<Option<IssuingAddress>, StoreError>;

    async fn list_issuing_addresses(
        &self,
        organization: Option<OrganizationId>,
    ) -> Result<Vec<IssuingAddress>, StoreError>;

    async fn insert_issuing_address(&self, address: &IssuingAddress) -> Result<(), StoreError>;

    // -- Requirement templates and instances ---------------------------------

    async fn get_template(&self, id: TemplateId) -> Result<Option<RequirementTemplate>, StoreError>;

    /// Templates ordered by code.
    async fn list_templates(&self) -> Result<Vec<RequirementTemplate>, StoreError>;

    /// Insert or replace a template by id.
    async fn upsert_template(&self, template: &RequirementTemplate) -> Result<(), StoreError>;

    /// Instances of one asset, ordered by template code.
    async fn list_requirement_instances(
        &self,
        asset_id: AssetId,
    ) -> Result<Vec<RequirementInstance>, StoreError>;

    /// Insert unless an instance for `(asset_id, template_id)` exists.
    ///
    /// Returns `true` when a row was created.
    async fn insert_requirement_instance(
        &self,
        instance: &RequirementInstance,
    ) -> Result<bool, StoreError>;

    /// Set an instance's status. Returns `false` when the instance is unknown.
    async fn update_requirement_status(
        &self,
        id: RequirementInstanceId,
        status: RequirementStatus,
    ) -> Result<bool, StoreError>;

    // -- Issuances -------------------------------------------------------

    async fn get_issuance(&self, id: IssuanceId) -> Result<Option<Issuance>, StoreError>;

    /// Issuances, optionally filtered by status, oldest submission first.
    async fn list_issuances(
        &self,
        status: Option<IssuanceStatus>,
    ) -> Result<Vec<Issuance>, StoreError>;

    async fn insert_issuance(&self, issuance: &Issuance) -> Result<(), StoreError>;

    /// Persist a finalized issuance if the stored row is still `SUBMITTED`.
    ///
    /// Returns `false` when nothing was written (already terminal or unknown).
    async fn update_issuance_if_submitted(&self, issuance: &Issuance) -> Result<bool, StoreError>;
}
