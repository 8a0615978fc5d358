//! In-memory [`Store`] backed by `parking_lot::RwLock`-guarded maps.
//!
//! Used when no `DATABASE_URL` is configured and throughout the tests.
//! Lock guards are never held across an `.await`.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use tokenops_core::{
    Asset, AssetId, IssuanceId, IssuingAddress, IssuingAddressId, OrganizationId,
    RequirementInstance, RequirementInstanceId, RequirementStatus, RequirementTemplate,
    TemplateId, Timestamp,
};
use tokenops_state::{Issuance, IssuanceStatus};

use crate::error::StoreError;
use crate::fixtures::Fixtures;
use crate::Store;

#[derive(Default)]
struct Tables {
    assets: HashMap<AssetId, Asset>,
    issuing_addresses: HashMap<IssuingAddressId, IssuingAddress>,
    templates: HashMap<TemplateId, RequirementTemplate>,
    instances: HashMap<RequirementInstanceId, RequirementInstance>,
    issuances: HashMap<IssuanceId, Issuance>,
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let t = self.tables.read();
        f.debug_struct("MemoryStore")
            .field("assets", &t.assets.len())
            .field("issuing_addresses", &t.issuing_addresses.len())
            .field("templates", &t.templates.len())
            .field("instances", &t.instances.len())
            .field("issuances", &t.issuances.len())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `fixtures`.
    ///
    /// Duplicate requirement instances for the same `(asset, template)` are
    /// dropped with a warning, keeping the first.
    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        let store = Self::new();
        {
            let mut t = store.tables.write();
            for a in fixtures.issuing_addresses {
                t.issuing_addresses.insert(a.id, a);
            }
            for a in fixtures.assets {
                t.assets.insert(a.id, a);
            }
            for tpl in fixtures.templates {
                if code_taken(&t, &tpl) {
                    tracing::warn!(
                        template_id = %tpl.id,
                        code = %tpl.code,
                        "template code already used in fixtures, skipping"
                    );
                    continue;
                }
                t.templates.insert(tpl.id, tpl);
            }
            for inst in fixtures.requirement_instances {
                if has_instance(&t, inst.asset_id, inst.template_id) {
                    tracing::warn!(
                        asset_id = %inst.asset_id,
                        template_id = %inst.template_id,
                        "duplicate requirement instance in fixtures, skipping"
                    );
                    continue;
                }
                t.instances.insert(inst.id, inst);
            }
            for i in fixtures.issuances {
                t.issuances.insert(i.id, i);
            }
        }
        tracing::debug!(store = ?store, "memory store seeded from fixtures");
        store
    }
}

/// Template codes are unique; the id is the identity that gets updated.
fn code_taken(t: &Tables, template: &RequirementTemplate) -> bool {
    t.templates
        .values()
        .any(|other| other.code == template.code && other.id != template.id)
}

fn has_instance(t: &Tables, asset_id: AssetId, template_id: TemplateId) -> bool {
    t.instances
        .values()
        .any(|i| i.asset_id == asset_id && i.template_id == template_id)
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_asset(&self, id: AssetId) -> Result<Option<Asset>, StoreError> {
        Ok(self.tables.read().assets.get(&id).cloned())
    }

    async fn list_assets(
        &self,
        organization: Option<OrganizationId>,
    ) -> Result<Vec<Asset>, StoreError> {
        let mut assets: Vec<Asset> = self
            .tables
            .read()
            .assets
            .values()
            .filter(|a| organization.map_or(true, |org| a.organization_id == org))
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(assets)
    }

    async fn insert_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        let mut t = self.tables.write();
        if t.assets.contains_key(&asset.id) {
            return Err(StoreError::Conflict {
                kind: "asset",
                id: asset.id.to_string(),
            });
        }
        t.assets.insert(asset.id, asset.clone());
        Ok(())
    }

    async fn get_issuing_address(
        &self,
        id: IssuingAddressId,
    ) -> Result<Option<IssuingAddress>, StoreError> {
        Ok(self.tables.read().issuing_addresses.get(&id).cloned())
    }

    async fn list_issuing_addresses(
        &self,
        organization: Option<OrganizationId>,
    ) -> Result<Vec<IssuingAddress>, StoreError> {
        let mut addresses: Vec<IssuingAddress> = self
            .tables
            .read()
            .issuing_addresses
            .values()
            .filter(|a| organization.map_or(true, |org| a.organization_id == org))
            .cloned()
            .collect();
        addresses.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(addresses)
    }

    async fn insert_issuing_address(&self, address: &IssuingAddress) -> Result<(), StoreError> {
        let mut t = self.tables.write();
        if t.issuing_addresses.contains_key(&address.id) {
            return Err(StoreError::Conflict {
                kind: "issuing address",
                id: address.id.to_string(),
            });
        }
        t.issuing_addresses.insert(address.id, address.clone());
        Ok(())
    }

    async fn get_template(&self, id: TemplateId) -> Result<Option<RequirementTemplate>, StoreError> {
        Ok(self.tables.read().templates.get(&id).cloned())
    }

    async fn list_templates(&self) -> Result<Vec<RequirementTemplate>, StoreError> {
        let mut templates: Vec<RequirementTemplate> =
            self.tables.read().templates.values().cloned().collect();
        templates.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(templates)
    }

    async fn upsert_template(&self, template: &RequirementTemplate) -> Result<(), StoreError> {
        let mut t = self.tables.write();
        if code_taken(&t, template) {
            return Err(StoreError::Conflict {
                kind: "requirement template",
                id: template.code.clone(),
            });
        }
        t.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn list_requirement_instances(
        &self,
        asset_id: AssetId,
    ) -> Result<Vec<RequirementInstance>, StoreError> {
        let mut instances: Vec<RequirementInstance> = self
            .tables
            .read()
            .instances
            .values()
            .filter(|i| i.asset_id == asset_id)
            .cloned()
            .collect();
        instances.sort_by(|a, b| a.template_code.cmp(&b.template_code));
        Ok(instances)
    }

    async fn insert_requirement_instance(
        &self,
        instance: &RequirementInstance,
    ) -> Result<bool, StoreError> {
        let mut t = self.tables.write();
        if has_instance(&t, instance.asset_id, instance.template_id) {
            return Ok(false);
        }
        t.instances.insert(instance.id, instance.clone());
        Ok(true)
    }

    async fn update_requirement_status(
        &self,
        id: RequirementInstanceId,
        status: RequirementStatus,
    ) -> Result<bool, StoreError> {
        let mut t = self.tables.write();
        match t.instances.get_mut(&id) {
            Some(instance) => {
                instance.status = status;
                instance.updated_at = Timestamp::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_issuance(&self, id: IssuanceId) -> Result<Option<Issuance>, StoreError> {
        Ok(self.tables.read().issuances.get(&id).cloned())
    }

    async fn list_issuances(
        &self,
        status: Option<IssuanceStatus>,
    ) -> Result<Vec<Issuance>, StoreError> {
        let mut issuances: Vec<Issuance> = self
            .tables
            .read()
            .issuances
            .values()
            .filter(|i| status.map_or(true, |s| i.status == s))
            .cloned()
            .collect();
        issuances.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        Ok(issuances)
    }

    async fn insert_issuance(&self, issuance: &Issuance) -> Result<(), StoreError> {
        let mut t = self.tables.write();
        if t.issuances.contains_key(&issuance.id) {
            return Err(StoreError::Conflict {
                kind: "issuance",
                id: issuance.id.to_string(),
            });
        }
        t.issuances.insert(issuance.id, issuance.clone());
        Ok(())
    }

    async fn update_issuance_if_submitted(&self, issuance: &Issuance) -> Result<bool, StoreError> {
        let mut t = self.tables.write();
        match t.issuances.get_mut(&issuance.id) {
            Some(stored) if stored.status == IssuanceStatus::Submitted => {
                *stored = issuance.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenops_core::{
        Applicability, AssetClass, ComplianceMode, EnforcementLevel, Ledger, Regime,
    };
    use tokenops_state::TES_SUCCESS;

    fn asset() -> Asset {
        Asset::new(
            OrganizationId::new(),
            "USD",
            "Acme Dollar",
            Ledger::Xrpl,
            ComplianceMode::GatedBefore,
            AssetClass::Stablecoin,
        )
        .unwrap()
    }

    fn template(code: &str) -> RequirementTemplate {
        RequirementTemplate {
            id: TemplateId::new(),
            code: code.to_string(),
            regime: Regime::Fatf,
            title: "Travel rule".to_string(),
            description: None,
            enforcement: EnforcementLevel::BeforeTransfer,
            priority: 10,
            applicability: Applicability::Always,
        }
    }

    #[tokio::test]
    async fn test_asset_roundtrip_and_conflict() {
        let store = MemoryStore::new();
        let a = asset();
        store.insert_asset(&a).await.unwrap();
        assert_eq!(store.get_asset(a.id).await.unwrap(), Some(a.clone()));
        assert!(matches!(
            store.insert_asset(&a).await,
            Err(StoreError::Conflict { kind: "asset", .. })
        ));
        assert!(store.get_asset(AssetId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_assets_filters_by_organization() {
        let store = MemoryStore::new();
        let a = asset();
        let b = asset();
        store.insert_asset(&a).await.unwrap();
        store.insert_asset(&b).await.unwrap();
        assert_eq!(store.list_assets(None).await.unwrap().len(), 2);
        let only_a = store.list_assets(Some(a.organization_id)).await.unwrap();
        assert_eq!(only_a, vec![a]);
    }

    #[tokio::test]
    async fn test_requirement_instance_unique_per_asset_and_template() {
        let store = MemoryStore::new();
        let a = asset();
        let tpl = template("FATF_TRAVEL_RULE");
        let first = RequirementInstance::pending(a.id, &tpl, "always".into());
        let second = RequirementInstance::pending(a.id, &tpl, "always".into());
        assert!(store.insert_requirement_instance(&first).await.unwrap());
        assert!(!store.insert_requirement_instance(&second).await.unwrap());
        assert_eq!(store.list_requirement_instances(a.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_requirement_status() {
        let store = MemoryStore::new();
        let a = asset();
        let tpl = template("FATF_TRAVEL_RULE");
        let inst = RequirementInstance::pending(a.id, &tpl, "always".into());
        store.insert_requirement_instance(&inst).await.unwrap();
        assert!(store
            .update_requirement_status(inst.id, RequirementStatus::Waived)
            .await
            .unwrap());
        let stored = store.list_requirement_instances(a.id).await.unwrap();
        assert_eq!(stored[0].status, RequirementStatus::Waived);
        assert!(!store
            .update_requirement_status(RequirementInstanceId::new(), RequirementStatus::Waived)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_templates_listed_by_code() {
        let store = MemoryStore::new();
        store.upsert_template(&template("B")).await.unwrap();
        store.upsert_template(&template("A")).await.unwrap();
        let codes: Vec<String> = store
            .list_templates()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.code)
            .collect();
        assert_eq!(codes, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_template_upsert_updates_by_id_and_rejects_taken_code() {
        let store = MemoryStore::new();
        let mut builtin = template("MICA_WHITEPAPER");
        store.upsert_template(&builtin).await.unwrap();

        builtin.priority = 5;
        store.upsert_template(&builtin).await.unwrap();
        let stored = store.get_template(builtin.id).await.unwrap().unwrap();
        assert_eq!(stored.priority, 5);

        let custom = template("MICA_WHITEPAPER");
        assert!(matches!(
            store.upsert_template(&custom).await,
            Err(StoreError::Conflict { kind: "requirement template", .. })
        ));
        assert!(store.get_template(custom.id).await.unwrap().is_none());
        assert_eq!(store.list_templates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_conditional_issuance_update() {
        let store = MemoryStore::new();
        let mut iss = Issuance::submitted(AssetId::new(), "5", "rDest", "HASH1", Some(10)).unwrap();
        store.insert_issuance(&iss).await.unwrap();

        iss.confirm(TES_SUCCESS, Some(9)).unwrap();
        assert!(store.update_issuance_if_submitted(&iss).await.unwrap());

        // Second writer loses the race: stored row is already terminal.
        let mut stale = iss.clone();
        stale.status = IssuanceStatus::Failed;
        assert!(!store.update_issuance_if_submitted(&stale).await.unwrap());
        let stored = store.get_issuance(iss.id).await.unwrap().unwrap();
        assert_eq!(stored.status, IssuanceStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_list_issuances_by_status() {
        let store = MemoryStore::new();
        let open = Issuance::submitted(AssetId::new(), "1", "r", "H1", None).unwrap();
        let mut done = Issuance::submitted(AssetId::new(), "1", "r", "H2", None).unwrap();
        done.expire().unwrap();
        store.insert_issuance(&open).await.unwrap();
        store.insert_issuance(&done).await.unwrap();

        let submitted = store
            .list_issuances(Some(IssuanceStatus::Submitted))
            .await
            .unwrap();
        assert_eq!(submitted, vec![open]);
        assert_eq!(store.list_issuances(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_from_fixtures_drops_duplicate_instances() {
        let a = asset();
        let tpl = template("FATF_TRAVEL_RULE");
        let fixtures = Fixtures {
            assets: vec![a.clone()],
            templates: vec![tpl.clone()],
            requirement_instances: vec![
                RequirementInstance::pending(a.id, &tpl, "x".into()),
                RequirementInstance::pending(a.id, &tpl, "y".into()),
            ],
            ..Default::default()
        };
        let store = MemoryStore::from_fixtures(fixtures);
        assert_eq!(store.list_requirement_instances(a.id).await.unwrap().len(), 1);
        assert!(store.get_template(tpl.id).await.unwrap().is_some());
    }
}
