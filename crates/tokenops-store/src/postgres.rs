//! # PostgreSQL Store
//!
//! [`Store`] over a `sqlx::PgPool`. Enum columns are stored as their
//! `SCREAMING_SNAKE_CASE` strings; controls, registry, and applicability
//! expressions are stored as JSONB.
//!
//! A row that no longer converts to a domain record (unknown enum string,
//! malformed JSON, out-of-range number) fails the whole read with
//! [`StoreError::Corrupt`]. It is never reported as missing.
//!
//! Templates are identified by id. Upserting a template whose code is held
//! by another id is a [`StoreError::Conflict`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use tokenops_core::{
    Asset, AssetControls, AssetId, IssuanceId, IssuingAddress, IssuingAddressId, LedgerAddress,
    OrganizationId, Registry, RequirementInstance, RequirementInstanceId, RequirementStatus,
    RequirementTemplate, TemplateId, Timestamp, ValidationError,
};
use tokenops_state::{Issuance, IssuanceStatus};

use crate::error::StoreError;
use crate::Store;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to `url` and apply embedded migrations.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;
        tracing::info!("connected to PostgreSQL");

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");

        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are not run.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn ts(dt: DateTime<Utc>) -> Timestamp {
    Timestamp::from_utc(dt)
}

fn to_u32(kind: &'static str, id: Uuid, value: Option<i64>) -> Result<Option<u32>, StoreError> {
    value
        .map(|v| {
            u32::try_from(v).map_err(|_| StoreError::Corrupt {
                kind,
                id: id.to_string(),
                reason: format!("ledger number {v} out of range"),
            })
        })
        .transpose()
}

fn corrupt(kind: &'static str, id: Uuid) -> impl Fn(ValidationError) -> StoreError {
    move |e| StoreError::Corrupt {
        kind,
        id: id.to_string(),
        reason: e.to_string(),
    }
}

fn json<T: serde::Serialize>(
    kind: &'static str,
    id: Uuid,
    value: &T,
) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Corrupt {
        kind,
        id: id.to_string(),
        reason: e.to_string(),
    })
}

fn logged<T>(converted: Result<T, StoreError>) -> Result<T, StoreError> {
    if let Err(e) = &converted {
        tracing::error!(error = %e, "unreadable row");
    }
    converted
}

/// Convert every row, failing on the first unreadable one.
fn all_records<R, T>(
    rows: Vec<R>,
    convert: impl Fn(R) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(|row| logged(convert(row))).collect()
}

fn one_record<R, T>(
    row: Option<R>,
    convert: impl Fn(R) -> Result<T, StoreError>,
) -> Result<Option<T>, StoreError> {
    row.map(|r| logged(convert(r))).transpose()
}

// -- Row types ----------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    organization_id: Uuid,
    code: String,
    name: String,
    ledger: String,
    compliance_mode: String,
    asset_class: String,
    registry: serde_json::Value,
    controls: serde_json::Value,
    issuing_address_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AssetRow {
    fn from_record(asset: &Asset) -> Result<Self, StoreError> {
        let id = *asset.id.as_uuid();
        Ok(Self {
            id,
            organization_id: *asset.organization_id.as_uuid(),
            code: asset.code.clone(),
            name: asset.name.clone(),
            ledger: asset.ledger.as_str().to_string(),
            compliance_mode: asset.compliance_mode.as_str().to_string(),
            asset_class: asset.asset_class.as_str().to_string(),
            registry: json("asset", id, &asset.registry)?,
            controls: json("asset", id, &asset.controls)?,
            issuing_address_id: asset.issuing_address_id.map(|i| *i.as_uuid()),
            created_at: *asset.created_at.as_datetime(),
            updated_at: *asset.updated_at.as_datetime(),
        })
    }

    fn into_record(self) -> Result<Asset, StoreError> {
        let bad = corrupt("asset", self.id);
        let json_err = |e: serde_json::Error| StoreError::Corrupt {
            kind: "asset",
            id: self.id.to_string(),
            reason: e.to_string(),
        };
        let ledger = self.ledger.parse().map_err(&bad)?;
        let controls: AssetControls =
            serde_json::from_value(self.controls.clone()).map_err(json_err)?;
        if controls.ledger() != ledger {
            return Err(bad(ValidationError::ControlsLedgerMismatch {
                ledger,
                controls: controls.ledger(),
            }));
        }
        let registry: Registry =
            serde_json::from_value(self.registry.clone()).map_err(json_err)?;
        Ok(Asset {
            id: AssetId::from_uuid(self.id),
            organization_id: OrganizationId::from_uuid(self.organization_id),
            code: self.code,
            name: self.name,
            ledger,
            compliance_mode: self.compliance_mode.parse().map_err(&bad)?,
            asset_class: self.asset_class.parse().map_err(&bad)?,
            registry,
            controls,
            issuing_address_id: self.issuing_address_id.map(IssuingAddressId::from_uuid),
            created_at: ts(self.created_at),
            updated_at: ts(self.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IssuingAddressRow {
    id: Uuid,
    organization_id: Uuid,
    address: String,
    ledger: String,
    network: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IssuingAddressRow {
    fn from_record(address: &IssuingAddress) -> Self {
        Self {
            id: *address.id.as_uuid(),
            organization_id: *address.organization_id.as_uuid(),
            address: address.address.as_str().to_string(),
            ledger: address.ledger.as_str().to_string(),
            network: address.network.as_str().to_string(),
            status: address.status.as_str().to_string(),
            created_at: *address.created_at.as_datetime(),
            updated_at: *address.updated_at.as_datetime(),
        }
    }

    fn into_record(self) -> Result<IssuingAddress, StoreError> {
        let bad = corrupt("issuing address", self.id);
        let ledger = self.ledger.parse().map_err(&bad)?;
        Ok(IssuingAddress {
            id: IssuingAddressId::from_uuid(self.id),
            organization_id: OrganizationId::from_uuid(self.organization_id),
            address: LedgerAddress::parse(ledger, &self.address).map_err(&bad)?,
            ledger,
            network: self.network.parse().map_err(&bad)?,
            status: self.status.parse().map_err(&bad)?,
            created_at: ts(self.created_at),
            updated_at: ts(self.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    code: String,
    regime: String,
    title: String,
    description: Option<String>,
    enforcement: String,
    priority: i32,
    applicability: serde_json::Value,
}

impl TemplateRow {
    fn from_record(template: &RequirementTemplate) -> Result<Self, StoreError> {
        let id = *template.id.as_uuid();
        let priority = i32::try_from(template.priority).map_err(|_| StoreError::Corrupt {
            kind: "requirement template",
            id: id.to_string(),
            reason: format!("priority {} out of range", template.priority),
        })?;
        Ok(Self {
            id,
            code: template.code.clone(),
            regime: template.regime.as_str().to_string(),
            title: template.title.clone(),
            description: template.description.clone(),
            enforcement: template.enforcement.as_str().to_string(),
            priority,
            applicability: json("requirement template", id, &template.applicability)?,
        })
    }

    fn into_record(self) -> Result<RequirementTemplate, StoreError> {
        let bad = corrupt("requirement template", self.id);
        let applicability =
            serde_json::from_value(self.applicability).map_err(|e| StoreError::Corrupt {
                kind: "requirement template",
                id: self.id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(RequirementTemplate {
            id: TemplateId::from_uuid(self.id),
            code: self.code,
            regime: self.regime.parse().map_err(&bad)?,
            title: self.title,
            description: self.description,
            enforcement: self.enforcement.parse().map_err(&bad)?,
            priority: u32::try_from(self.priority).map_err(|_| StoreError::Corrupt {
                kind: "requirement template",
                id: self.id.to_string(),
                reason: format!("priority {} out of range", self.priority),
            })?,
            applicability,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InstanceRow {
    id: Uuid,
    asset_id: Uuid,
    template_id: Uuid,
    template_code: String,
    status: String,
    rationale: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InstanceRow {
    fn from_record(instance: &RequirementInstance) -> Self {
        Self {
            id: *instance.id.as_uuid(),
            asset_id: *instance.asset_id.as_uuid(),
            template_id: *instance.template_id.as_uuid(),
            template_code: instance.template_code.clone(),
            status: instance.status.as_str().to_string(),
            rationale: instance.rationale.clone(),
            created_at: *instance.created_at.as_datetime(),
            updated_at: *instance.updated_at.as_datetime(),
        }
    }

    fn into_record(self) -> Result<RequirementInstance, StoreError> {
        let bad = corrupt("requirement instance", self.id);
        Ok(RequirementInstance {
            id: RequirementInstanceId::from_uuid(self.id),
            asset_id: AssetId::from_uuid(self.asset_id),
            template_id: TemplateId::from_uuid(self.template_id),
            template_code: self.template_code,
            status: self.status.parse().map_err(&bad)?,
            rationale: self.rationale,
            created_at: ts(self.created_at),
            updated_at: ts(self.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IssuanceRow {
    id: Uuid,
    asset_id: Uuid,
    amount: String,
    destination: String,
    tx_hash: String,
    last_ledger_sequence: Option<i64>,
    status: String,
    result_code: Option<String>,
    ledger_index: Option<i64>,
    failure_reason: Option<String>,
    submitted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
}

impl IssuanceRow {
    fn from_record(issuance: &Issuance) -> Self {
        Self {
            id: *issuance.id.as_uuid(),
            asset_id: *issuance.asset_id.as_uuid(),
            amount: issuance.amount.clone(),
            destination: issuance.destination.clone(),
            tx_hash: issuance.tx_hash.clone(),
            last_ledger_sequence: issuance.last_ledger_sequence.map(i64::from),
            status: issuance.status.as_str().to_string(),
            result_code: issuance.result_code.clone(),
            ledger_index: issuance.ledger_index.map(i64::from),
            failure_reason: issuance.failure_reason.clone(),
            submitted_at: *issuance.submitted_at.as_datetime(),
            updated_at: *issuance.updated_at.as_datetime(),
            finalized_at: issuance.finalized_at.map(|t| *t.as_datetime()),
        }
    }

    fn into_record(self) -> Result<Issuance, StoreError> {
        let bad = corrupt("issuance", self.id);
        Ok(Issuance {
            id: IssuanceId::from_uuid(self.id),
            asset_id: AssetId::from_uuid(self.asset_id),
            amount: self.amount,
            destination: self.destination,
            tx_hash: self.tx_hash,
            last_ledger_sequence: to_u32("issuance", self.id, self.last_ledger_sequence)?,
            status: self.status.parse().map_err(&bad)?,
            result_code: self.result_code,
            ledger_index: to_u32("issuance", self.id, self.ledger_index)?,
            failure_reason: self.failure_reason,
            submitted_at: ts(self.submitted_at),
            updated_at: ts(self.updated_at),
            finalized_at: self.finalized_at.map(ts),
        })
    }
}

const ASSET_COLUMNS: &str = "id, organization_id, code, name, ledger, compliance_mode, \
     asset_class, registry, controls, issuing_address_id, created_at, updated_at";

const ISSUING_ADDRESS_COLUMNS: &str =
    "id, organization_id, address, ledger, network, status, created_at, updated_at";

const TEMPLATE_COLUMNS: &str =
    "id, code, regime, title, description, enforcement, priority, applicability";

const INSTANCE_COLUMNS: &str =
    "id, asset_id, template_id, template_code, status, rationale, created_at, updated_at";

const ISSUANCE_COLUMNS: &str = "id, asset_id, amount, destination, tx_hash, \
     last_ledger_sequence, status, result_code, ledger_index, failure_reason, \
     submitted_at, updated_at, finalized_at";

#[async_trait]
impl Store for PgStore {
    async fn get_asset(&self, id: AssetId) -> Result<Option<Asset>, StoreError> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        one_record(row, AssetRow::into_record)
    }

    async fn list_assets(
        &self,
        organization: Option<OrganizationId>,
    ) -> Result<Vec<Asset>, StoreError> {
        let rows = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets \
             WHERE ($1::uuid IS NULL OR organization_id = $1) \
             ORDER BY created_at, id"
        ))
        .bind(organization.map(|o| *o.as_uuid()))
        .fetch_all(&self.pool)
        .await?;
        all_records(rows, AssetRow::into_record)
    }

    async fn insert_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        let row = AssetRow::from_record(asset)?;
        let result = sqlx::query(&format!(
            "INSERT INTO assets ({ASSET_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (id) DO NOTHING"
        ))
        .bind(row.id)
        .bind(row.organization_id)
        .bind(row.code)
        .bind(row.name)
        .bind(row.ledger)
        .bind(row.compliance_mode)
        .bind(row.asset_class)
        .bind(row.registry)
        .bind(row.controls)
        .bind(row.issuing_address_id)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                kind: "asset",
                id: asset.id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_issuing_address(
        &self,
        id: IssuingAddressId,
    ) -> Result<Option<IssuingAddress>, StoreError> {
        let row = sqlx::query_as::<_, IssuingAddressRow>(&format!(
            "SELECT {ISSUING_ADDRESS_COLUMNS} FROM issuing_addresses WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        one_record(row, IssuingAddressRow::into_record)
    }

    async fn list_issuing_addresses(
        &self,
        organization: Option<OrganizationId>,
    ) -> Result<Vec<IssuingAddress>, StoreError> {
        let rows = sqlx::query_as::<_, IssuingAddressRow>(&format!(
            "SELECT {ISSUING_ADDRESS_COLUMNS} FROM issuing_addresses \
             WHERE ($1::uuid IS NULL OR organization_id = $1) \
             ORDER BY created_at, id"
        ))
        .bind(organization.map(|o| *o.as_uuid()))
        .fetch_all(&self.pool)
        .await?;
        all_records(rows, IssuingAddressRow::into_record)
    }

    async fn insert_issuing_address(&self, address: &IssuingAddress) -> Result<(), StoreError> {
        let row = IssuingAddressRow::from_record(address);
        let result = sqlx::query(&format!(
            "INSERT INTO issuing_addresses ({ISSUING_ADDRESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO NOTHING"
        ))
        .bind(row.id)
        .bind(row.organization_id)
        .bind(row.address)
        .bind(row.ledger)
        .bind(row.network)
        .bind(row.status)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                kind: "issuing address",
                id: address.id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_template(&self, id: TemplateId) -> Result<Option<RequirementTemplate>, StoreError> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM requirement_templates WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        one_record(row, TemplateRow::into_record)
    }

    async fn list_templates(&self) -> Result<Vec<RequirementTemplate>, StoreError> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM requirement_templates ORDER BY code"
        ))
        .fetch_all(&self.pool)
        .await?;
        all_records(rows, TemplateRow::into_record)
    }

    async fn upsert_template(&self, template: &RequirementTemplate) -> Result<(), StoreError> {
        let row = TemplateRow::from_record(template)?;
        sqlx::query(&format!(
            "INSERT INTO requirement_templates ({TEMPLATE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET code = EXCLUDED.code, regime = EXCLUDED.regime, \
             title = EXCLUDED.title, description = EXCLUDED.description, \
             enforcement = EXCLUDED.enforcement, priority = EXCLUDED.priority, \
             applicability = EXCLUDED.applicability"
        ))
        .bind(row.id)
        .bind(row.code)
        .bind(row.regime)
        .bind(row.title)
        .bind(row.description)
        .bind(row.enforcement)
        .bind(row.priority)
        .bind(row.applicability)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // An id clash is the upsert path, so a unique violation is the code.
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict {
                kind: "requirement template",
                id: template.code.clone(),
            },
            e => StoreError::Database(e),
        })?;
        Ok(())
    }

    async fn list_requirement_instances(
        &self,
        asset_id: AssetId,
    ) -> Result<Vec<RequirementInstance>, StoreError> {
        let rows = sqlx::query_as::<_, InstanceRow>(&format!(
            "SELECT {INSTANCE_COLUMNS} FROM requirement_instances \
             WHERE asset_id = $1 ORDER BY template_code"
        ))
        .bind(*asset_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        all_records(rows, InstanceRow::into_record)
    }

    async fn insert_requirement_instance(
        &self,
        instance: &RequirementInstance,
    ) -> Result<bool, StoreError> {
        let row = InstanceRow::from_record(instance);
        let result = sqlx::query(&format!(
            "INSERT INTO requirement_instances ({INSTANCE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (asset_id, template_id) DO NOTHING"
        ))
        .bind(row.id)
        .bind(row.asset_id)
        .bind(row.template_id)
        .bind(row.template_code)
        .bind(row.status)
        .bind(row.rationale)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_requirement_status(
        &self,
        id: RequirementInstanceId,
        status: RequirementStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE requirement_instances SET status = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(status.as_str())
        .bind(*Timestamp::now().as_datetime())
        .bind(*id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_issuance(&self, id: IssuanceId) -> Result<Option<Issuance>, StoreError> {
        let row = sqlx::query_as::<_, IssuanceRow>(&format!(
            "SELECT {ISSUANCE_COLUMNS} FROM issuances WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        one_record(row, IssuanceRow::into_record)
    }

    async fn list_issuances(
        &self,
        status: Option<IssuanceStatus>,
    ) -> Result<Vec<Issuance>, StoreError> {
        let rows = sqlx::query_as::<_, IssuanceRow>(&format!(
            "SELECT {ISSUANCE_COLUMNS} FROM issuances \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY submitted_at, id"
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        all_records(rows, IssuanceRow::into_record)
    }

    async fn insert_issuance(&self, issuance: &Issuance) -> Result<(), StoreError> {
        let row = IssuanceRow::from_record(issuance);
        let result = sqlx::query(&format!(
            "INSERT INTO issuances ({ISSUANCE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (id) DO NOTHING"
        ))
        .bind(row.id)
        .bind(row.asset_id)
        .bind(row.amount)
        .bind(row.destination)
        .bind(row.tx_hash)
        .bind(row.last_ledger_sequence)
        .bind(row.status)
        .bind(row.result_code)
        .bind(row.ledger_index)
        .bind(row.failure_reason)
        .bind(row.submitted_at)
        .bind(row.updated_at)
        .bind(row.finalized_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                kind: "issuance",
                id: issuance.id.to_string(),
            });
        }
        Ok(())
    }

    async fn update_issuance_if_submitted(&self, issuance: &Issuance) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE issuances SET status = $1, result_code = $2, ledger_index = $3, \
             failure_reason = $4, updated_at = $5, finalized_at = $6 \
             WHERE id = $7 AND status = 'SUBMITTED'",
        )
        .bind(issuance.status.as_str())
        .bind(&issuance.result_code)
        .bind(issuance.ledger_index.map(i64::from))
        .bind(&issuance.failure_reason)
        .bind(*issuance.updated_at.as_datetime())
        .bind(issuance.finalized_at.map(|t| *t.as_datetime()))
        .bind(*issuance.id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
