//! Fact bag evaluation against a catalog.

use serde::Serialize;

use tokenops_core::{EnforcementLevel, Regime, RequirementStatus, RequirementTemplate, TemplateId};

use super::applicability;
use super::catalog::Catalog;
use super::facts::FactBag;
use super::plan::{EnforcementPlan, PlanStep};

/// A requirement instance that would be created for the evaluated facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInstance {
    pub template_id: TemplateId,
    pub template_code: String,
    pub title: String,
    pub regime: Regime,
    pub enforcement: EnforcementLevel,
    pub priority: u32,
    pub status: RequirementStatus,
    pub rationale: String,
}

impl DraftInstance {
    pub fn plan_step(&self) -> (EnforcementLevel, PlanStep) {
        (
            self.enforcement,
            PlanStep {
                template_id: self.template_id,
                template_code: self.template_code.clone(),
                title: self.title.clone(),
                regime: self.regime,
                priority: self.priority,
                status: self.status,
            },
        )
    }
}

/// Why a template did or did not apply.
///
/// Entries exist for every matched template, and for unmatched templates
/// whose evaluation hit a type mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RationaleEntry {
    pub template_id: TemplateId,
    pub template_code: String,
    pub regime: Regime,
    pub matched: bool,
    /// The template's applicability expression, rendered.
    pub expression: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelEvaluation {
    pub requirement_instances: Vec<DraftInstance>,
    pub rationale: Vec<RationaleEntry>,
    pub enforcement_plan: EnforcementPlan,
}

/// Evaluate every template in catalog order.
pub fn evaluate_facts(catalog: &Catalog, facts: &FactBag) -> KernelEvaluation {
    let mut requirement_instances = Vec::new();
    let mut rationale = Vec::new();

    for template in catalog.templates() {
        let outcome = applicability::evaluate(&template.applicability, facts);
        if outcome.matched || !outcome.notes.is_empty() {
            rationale.push(RationaleEntry {
                template_id: template.id,
                template_code: template.code.clone(),
                regime: template.regime,
                matched: outcome.matched,
                expression: template.applicability.to_string(),
                notes: outcome.notes,
            });
        }
        if outcome.matched {
            requirement_instances.push(draft(template));
        }
    }

    let enforcement_plan =
        EnforcementPlan::from_steps(requirement_instances.iter().map(DraftInstance::plan_step));

    tracing::debug!(
        templates = catalog.len(),
        matched = requirement_instances.len(),
        issuance_blocked = enforcement_plan.issuance_blocked,
        "evaluated policy facts"
    );

    KernelEvaluation {
        requirement_instances,
        rationale,
        enforcement_plan,
    }
}

fn draft(template: &RequirementTemplate) -> DraftInstance {
    DraftInstance {
        template_id: template.id,
        template_code: template.code.clone(),
        title: template.title.clone(),
        regime: template.regime,
        enforcement: template.enforcement,
        priority: template.priority,
        status: RequirementStatus::Pending,
        rationale: format!(
            "{} ({}) applies: {}",
            template.code, template.regime, template.applicability
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::facts::{DistributionType, InvestorAudience, TransferType};
    use tokenops_core::{AssetClass, Ledger};

    fn codes(eval: &KernelEvaluation) -> Vec<&str> {
        eval.requirement_instances
            .iter()
            .map(|d| d.template_code.as_str())
            .collect()
    }

    #[test]
    fn test_eu_stablecoin_needs_emt_and_whitepaper() {
        let facts = FactBag::new()
            .with_issuer_country("de")
            .with_asset_class(AssetClass::Stablecoin)
            .with_target_markets(["EU"])
            .with_ledger(Ledger::Xrpl)
            .with_distribution(DistributionType::PublicOffer);
        let eval = evaluate_facts(&Catalog::builtin(), &facts);
        assert_eq!(codes(&eval), ["MICA_WHITEPAPER", "MICA_EMT_AUTHORISATION"]);
        assert!(eval.enforcement_plan.issuance_blocked);
        assert_eq!(
            eval.enforcement_plan.before_issuance[0].template_code,
            "MICA_EMT_AUTHORISATION"
        );
        assert!(eval.requirement_instances.iter().all(|d| d.status == RequirementStatus::Pending));
    }

    #[test]
    fn test_us_private_equity_on_xrpl() {
        let facts = FactBag::new()
            .with_asset_class(AssetClass::Equity)
            .with_target_markets(["US"])
            .with_ledger(Ledger::Xrpl)
            .with_distribution(DistributionType::PrivatePlacement)
            .with_audience(InvestorAudience::Accredited)
            .with_transfer_type(TransferType::Restricted);
        let eval = evaluate_facts(&Catalog::builtin(), &facts);
        assert_eq!(codes(&eval), ["US_SEC_REG_D", "LEDGER_REQUIRE_AUTH"]);
        let steps: Vec<_> = eval
            .enforcement_plan
            .before_issuance
            .iter()
            .map(|s| s.template_code.as_str())
            .collect();
        assert_eq!(steps, ["LEDGER_REQUIRE_AUTH", "US_SEC_REG_D"]);
    }

    #[test]
    fn test_casp_adds_transfer_stage() {
        let facts = FactBag::new()
            .with_asset_class(AssetClass::Utility)
            .with_target_markets(["EU"])
            .with_casp(true)
            .with_distribution(DistributionType::Airdrop);
        let eval = evaluate_facts(&Catalog::builtin(), &facts);
        let transfer: Vec<_> = eval
            .enforcement_plan
            .before_transfer
            .iter()
            .map(|s| s.template_code.as_str())
            .collect();
        assert_eq!(transfer, ["FATF_TRAVEL_RULE", "MICA_CASP_AUTHORISATION"]);
        assert_eq!(eval.enforcement_plan.advisory[0].template_code, "AIRDROP_DISCLOSURE");
    }

    #[test]
    fn test_no_facts_match_nothing() {
        let eval = evaluate_facts(&Catalog::builtin(), &FactBag::new());
        assert!(eval.requirement_instances.is_empty());
        assert!(eval.rationale.is_empty());
        assert!(!eval.enforcement_plan.issuance_blocked);
    }

    #[test]
    fn test_rationale_names_template_regime_and_expression() {
        let facts = FactBag::new().with_casp(true);
        let eval = evaluate_facts(&Catalog::builtin(), &facts);
        let entry = eval
            .rationale
            .iter()
            .find(|r| r.template_code == "FATF_TRAVEL_RULE")
            .unwrap();
        assert!(entry.matched);
        assert_eq!(entry.regime, Regime::Fatf);
        assert_eq!(entry.expression, "involvesCasp is true");
    }

    #[test]
    fn test_type_mismatch_is_reported_in_rationale() {
        let catalog = Catalog::from_yaml_str(
            r#"
templates:
  - id: 6f1c0d1e-0000-4000-8000-0000000000aa
    code: BAD_SHAPE
    regime: FATF
    title: Bad shape
    enforcement: ADVISORY
    applicability:
      includes: { fact: issuerCountry, value: DE }
"#,
        )
        .unwrap();
        let eval = evaluate_facts(&catalog, &FactBag::new().with_issuer_country("DE"));
        assert!(eval.requirement_instances.is_empty());
        assert_eq!(eval.rationale.len(), 1);
        assert!(!eval.rationale[0].matched);
        assert!(eval.rationale[0].notes[0].contains("type mismatch"));
    }

    #[test]
    fn test_evaluation_json_shape() {
        let facts = FactBag::new().with_casp(true);
        let json = serde_json::to_value(evaluate_facts(&Catalog::builtin(), &facts)).unwrap();
        assert!(json["requirementInstances"].is_array());
        assert!(json["enforcementPlan"]["beforeTransfer"].is_array());
        assert_eq!(json["requirementInstances"][0]["status"], "PENDING");
    }
}
