//! Persisting kernel evaluations as requirement instances.

use serde::Serialize;

use tokenops_core::{AssetId, RequirementInstance};
use tokenops_store::{Store, StoreError};

use super::catalog::Catalog;
use super::evaluation::{evaluate_facts, KernelEvaluation};
use super::facts::FactBag;
use super::plan::{EnforcementPlan, PlanStep};

/// Outcome of syncing an evaluation into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSync {
    /// Instances inserted by this call.
    pub created: Vec<RequirementInstance>,
    /// Matched templates that already had an instance for the asset.
    pub existing: usize,
    pub evaluation: KernelEvaluation,
}

/// Evaluate `facts` for an asset and insert an instance per matched
/// template. Re-running with the same facts inserts nothing new.
///
/// `assetClass` and `ledger` default to the stored asset's values.
pub async fn create_requirement_instances(
    store: &dyn Store,
    catalog: &Catalog,
    asset_id: AssetId,
    facts: &FactBag,
) -> Result<InstanceSync, StoreError> {
    let asset = store
        .get_asset(asset_id)
        .await?
        .ok_or_else(|| StoreError::not_found("asset", asset_id))?;
    let facts = facts.clone().with_asset_defaults(&asset);
    let evaluation = evaluate_facts(catalog, &facts);

    let mut created = Vec::new();
    let mut existing = 0;
    for draft in &evaluation.requirement_instances {
        let Some(template) = catalog.get(draft.template_id) else {
            continue;
        };
        store.upsert_template(template).await?;
        let instance = RequirementInstance::pending(asset_id, template, draft.rationale.clone());
        if store.insert_requirement_instance(&instance).await? {
            created.push(instance);
        } else {
            existing += 1;
        }
    }

    tracing::info!(
        asset_id = %asset_id,
        matched = evaluation.requirement_instances.len(),
        created = created.len(),
        existing,
        "synced requirement instances"
    );

    Ok(InstanceSync {
        created,
        existing,
        evaluation,
    })
}

/// Rebuild the enforcement plan from an asset's persisted instances, so
/// satisfied and waived requirements are reflected.
///
/// Templates resolve from `catalog` first, then from the store. Instances
/// whose template cannot be found are skipped with a warning.
pub async fn enforcement_plan_for_asset(
    store: &dyn Store,
    catalog: &Catalog,
    asset_id: AssetId,
) -> Result<EnforcementPlan, StoreError> {
    if store.get_asset(asset_id).await?.is_none() {
        return Err(StoreError::not_found("asset", asset_id));
    }

    let mut steps = Vec::new();
    for instance in store.list_requirement_instances(asset_id).await? {
        let template = match catalog.get(instance.template_id) {
            Some(t) => t.clone(),
            None => match store.get_template(instance.template_id).await? {
                Some(t) => t,
                None => {
                    tracing::warn!(
                        asset_id = %asset_id,
                        template_id = %instance.template_id,
                        template_code = %instance.template_code,
                        "requirement instance references an unknown template"
                    );
                    continue;
                }
            },
        };
        steps.push((
            template.enforcement,
            PlanStep {
                template_id: template.id,
                template_code: template.code,
                title: template.title,
                regime: template.regime,
                priority: template.priority,
                status: instance.status,
            },
        ));
    }

    Ok(EnforcementPlan::from_steps(steps))
}
