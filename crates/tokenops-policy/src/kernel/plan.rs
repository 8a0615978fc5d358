//! Enforcement plan: matched requirements grouped by stage.

use serde::Serialize;

use tokenops_core::{EnforcementLevel, Regime, RequirementStatus, TemplateId};

/// One requirement within a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub template_id: TemplateId,
    pub template_code: String,
    pub title: String,
    pub regime: Regime,
    pub priority: u32,
    pub status: RequirementStatus,
}

/// Requirements grouped into `beforeIssuance`, `beforeTransfer`, and
/// `advisory` stages, each ordered by `(priority, templateCode)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementPlan {
    pub before_issuance: Vec<PlanStep>,
    pub before_transfer: Vec<PlanStep>,
    pub advisory: Vec<PlanStep>,
    /// True iff any `beforeIssuance` step is neither satisfied nor waived.
    pub issuance_blocked: bool,
}

impl EnforcementPlan {
    pub fn from_steps(steps: impl IntoIterator<Item = (EnforcementLevel, PlanStep)>) -> Self {
        let mut plan = Self::default();
        for (level, step) in steps {
            match level {
                EnforcementLevel::BeforeIssuance => plan.before_issuance.push(step),
                EnforcementLevel::BeforeTransfer => plan.before_transfer.push(step),
                EnforcementLevel::Advisory => plan.advisory.push(step),
            }
        }
        for stage in [
            &mut plan.before_issuance,
            &mut plan.before_transfer,
            &mut plan.advisory,
        ] {
            stage.sort_by(|a, b| {
                (a.priority, &a.template_code).cmp(&(b.priority, &b.template_code))
            });
        }
        plan.issuance_blocked = plan
            .before_issuance
            .iter()
            .any(|step| !step.status.is_resolved());
        plan
    }

    pub fn len(&self) -> usize {
        self.before_issuance.len() + self.before_transfer.len() + self.advisory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(code: &str, priority: u32, status: RequirementStatus) -> PlanStep {
        PlanStep {
            template_id: TemplateId::new(),
            template_code: code.to_string(),
            title: code.to_lowercase(),
            regime: Regime::EuMica,
            priority,
            status,
        }
    }

    #[test]
    fn test_stages_sorted_by_priority_then_code() {
        let plan = EnforcementPlan::from_steps([
            (EnforcementLevel::BeforeIssuance, step("B", 10, RequirementStatus::Pending)),
            (EnforcementLevel::BeforeIssuance, step("A", 10, RequirementStatus::Pending)),
            (EnforcementLevel::BeforeIssuance, step("Z", 1, RequirementStatus::Pending)),
            (EnforcementLevel::Advisory, step("X", 0, RequirementStatus::Pending)),
        ]);
        let codes: Vec<_> = plan.before_issuance.iter().map(|s| s.template_code.as_str()).collect();
        assert_eq!(codes, ["Z", "A", "B"]);
        assert_eq!(plan.advisory.len(), 1);
        assert!(plan.before_transfer.is_empty());
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn test_blocked_until_every_issuance_step_resolved() {
        let plan = EnforcementPlan::from_steps([
            (EnforcementLevel::BeforeIssuance, step("A", 1, RequirementStatus::Satisfied)),
            (EnforcementLevel::BeforeIssuance, step("B", 2, RequirementStatus::Pending)),
        ]);
        assert!(plan.issuance_blocked);

        let plan = EnforcementPlan::from_steps([
            (EnforcementLevel::BeforeIssuance, step("A", 1, RequirementStatus::Satisfied)),
            (EnforcementLevel::BeforeIssuance, step("B", 2, RequirementStatus::Waived)),
            (EnforcementLevel::BeforeTransfer, step("C", 1, RequirementStatus::Pending)),
        ]);
        assert!(!plan.issuance_blocked);
    }

    #[test]
    fn test_empty_plan_is_not_blocked() {
        let plan = EnforcementPlan::from_steps([]);
        assert!(plan.is_empty());
        assert!(!plan.issuance_blocked);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["issuanceBlocked"], false);
        assert!(json["beforeIssuance"].as_array().unwrap().is_empty());
    }
}
