//! Requirement template catalog.
//!
//! The built-in catalog covers EU MiCA, the EU Prospectus Regulation, US
//! SEC registration and Regulation D, UK FCA financial promotions, the FATF
//! travel rule, and ledger-level controls. Built-in template ids are fixed
//! so that instances created by one process are recognised by the next.
//!
//! A catalog file replaces the built-in set entirely:
//!
//! ```yaml
//! templates:
//!   - id: 6f1c0d1e-0000-4000-8000-000000000001
//!     code: INTERNAL_KYC_REVIEW
//!     regime: FATF
//!     title: Internal KYC review
//!     enforcement: BEFORE_ISSUANCE
//!     priority: 10
//!     applicability: always
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use tokenops_core::{
    Applicability, AssetClass, EnforcementLevel, Fact, Regime, RequirementTemplate, TemplateId,
};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("duplicate template code {0:?}")]
    DuplicateCode(String),

    #[error("duplicate template id {0}")]
    DuplicateId(TemplateId),

    #[error("template {code}: `{operator}` needs at least one operand")]
    EmptyOperands { code: String, operator: &'static str },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An ordered, validated set of requirement templates.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    templates: Vec<RequirementTemplate>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    templates: Vec<RequirementTemplate>,
}

impl Catalog {
    /// Validate and wrap `templates`, keeping their order.
    pub fn new(templates: Vec<RequirementTemplate>) -> Result<Self, CatalogError> {
        let mut codes = HashSet::new();
        let mut ids = HashSet::new();
        for template in &templates {
            if !codes.insert(template.code.as_str()) {
                return Err(CatalogError::DuplicateCode(template.code.clone()));
            }
            if !ids.insert(template.id) {
                return Err(CatalogError::DuplicateId(template.id));
            }
            check_operands(&template.code, &template.applicability)?;
        }
        Ok(Self { templates })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.templates)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_yaml_str(&yaml)?;
        tracing::info!(
            path = %path.display(),
            templates = catalog.len(),
            "loaded policy catalog"
        );
        Ok(catalog)
    }

    pub fn templates(&self) -> &[RequirementTemplate] {
        &self.templates
    }

    pub fn get(&self, id: TemplateId) -> Option<&RequirementTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn by_code(&self, code: &str) -> Option<&RequirementTemplate> {
        self.templates.iter().find(|t| t.code == code)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The default regime set.
    pub fn builtin() -> Self {
        let mut n = 0u128;
        let mut template = |code: &str,
                            regime: Regime,
                            title: &str,
                            enforcement: EnforcementLevel,
                            priority: u32,
                            applicability: Applicability| {
            n += 1;
            RequirementTemplate {
                id: TemplateId::from_uuid(Uuid::from_u128(BUILTIN_ID_BASE + n)),
                code: code.to_string(),
                regime,
                title: title.to_string(),
                description: None,
                enforcement,
                priority,
                applicability,
            }
        };

        let eu = includes(Fact::TargetMarkets, "EU");
        let us = includes(Fact::TargetMarkets, "US");
        let uk = includes(Fact::TargetMarkets, "UK");
        let restricted = Applicability::Any(vec![
            one_of(Fact::TransferType, &["RESTRICTED", "WHITELIST"]),
            security(),
        ]);

        let templates = vec![
            template(
                "MICA_WHITEPAPER",
                Regime::EuMica,
                "Publish a MiCA crypto-asset white paper",
                EnforcementLevel::BeforeIssuance,
                10,
                Applicability::All(vec![
                    eu.clone(),
                    Applicability::Not(Box::new(security())),
                ]),
            ),
            template(
                "MICA_EMT_AUTHORISATION",
                Regime::EuMica,
                "Obtain authorisation as an e-money token issuer",
                EnforcementLevel::BeforeIssuance,
                5,
                Applicability::All(vec![
                    eu.clone(),
                    equals(Fact::AssetClass, AssetClass::Stablecoin.as_str()),
                ]),
            ),
            template(
                "MICA_CASP_AUTHORISATION",
                Regime::EuMica,
                "Use an authorised crypto-asset service provider",
                EnforcementLevel::BeforeTransfer,
                20,
                Applicability::All(vec![
                    eu.clone(),
                    Applicability::IsTrue {
                        fact: Fact::InvolvesCasp,
                    },
                ]),
            ),
            template(
                "EU_PROSPECTUS_APPROVAL",
                Regime::EuProspectus,
                "Obtain prospectus approval from the home member state",
                EnforcementLevel::BeforeIssuance,
                10,
                Applicability::All(vec![
                    eu,
                    security(),
                    equals(Fact::DistributionType, "PUBLIC_OFFER"),
                ]),
            ),
            template(
                "US_SEC_REGISTRATION",
                Regime::UsSec,
                "Register the offering with the SEC",
                EnforcementLevel::BeforeIssuance,
                10,
                Applicability::All(vec![
                    us.clone(),
                    security(),
                    equals(Fact::DistributionType, "PUBLIC_OFFER"),
                ]),
            ),
            template(
                "US_SEC_REG_D",
                Regime::UsSec,
                "File Form D and limit the offering to accredited investors",
                EnforcementLevel::BeforeIssuance,
                20,
                Applicability::All(vec![
                    us,
                    security(),
                    equals(Fact::DistributionType, "PRIVATE_PLACEMENT"),
                ]),
            ),
            template(
                "UK_FCA_FINANCIAL_PROMOTION",
                Regime::UkFca,
                "Have retail financial promotions approved by an FCA-authorised firm",
                EnforcementLevel::BeforeIssuance,
                30,
                Applicability::All(vec![uk, equals(Fact::InvestorAudience, "RETAIL")]),
            ),
            template(
                "FATF_TRAVEL_RULE",
                Regime::Fatf,
                "Exchange originator and beneficiary data on transfers",
                EnforcementLevel::BeforeTransfer,
                10,
                Applicability::IsTrue {
                    fact: Fact::InvolvesCasp,
                },
            ),
            template(
                "LEDGER_REQUIRE_AUTH",
                Regime::LedgerControls,
                "Enable RequireAuth on the XRPL issuing account",
                EnforcementLevel::BeforeIssuance,
                1,
                Applicability::All(vec![equals(Fact::Ledger, "XRPL"), restricted.clone()]),
            ),
            template(
                "LEDGER_EVM_ALLOWLIST",
                Regime::LedgerControls,
                "Enable the holder allowlist on the EVM token contract",
                EnforcementLevel::BeforeIssuance,
                1,
                Applicability::All(vec![equals(Fact::Ledger, "EVM"), restricted]),
            ),
            template(
                "AIRDROP_DISCLOSURE",
                Regime::EuMica,
                "Disclose airdrop terms to recipients",
                EnforcementLevel::Advisory,
                50,
                equals(Fact::DistributionType, "AIRDROP"),
            ),
        ];

        Self { templates }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN_ID_BASE: u128 = 0x7f0c_a7a1_0000_4000_8000_0000_0000_0000;

fn includes(fact: Fact, value: &str) -> Applicability {
    Applicability::Includes {
        fact,
        value: json!(value),
    }
}

fn equals(fact: Fact, value: &str) -> Applicability {
    Applicability::Equals {
        fact,
        value: json!(value),
    }
}

fn one_of(fact: Fact, values: &[&str]) -> Applicability {
    Applicability::OneOf {
        fact,
        values: values.iter().map(|v| Value::from(*v)).collect(),
    }
}

fn security() -> Applicability {
    Applicability::OneOf {
        fact: Fact::AssetClass,
        values: AssetClass::all()
            .iter()
            .filter(|c| c.is_security())
            .map(|c| Value::from(c.as_str()))
            .collect(),
    }
}

fn check_operands(code: &str, expr: &Applicability) -> Result<(), CatalogError> {
    let empty = |operator| CatalogError::EmptyOperands {
        code: code.to_string(),
        operator,
    };
    match expr {
        Applicability::All(items) if items.is_empty() => Err(empty("all")),
        Applicability::Any(items) if items.is_empty() => Err(empty("any")),
        Applicability::OneOf { values, .. } if values.is_empty() => Err(empty("one_of")),
        Applicability::Intersects { values, .. } if values.is_empty() => Err(empty("intersects")),
        Applicability::All(items) | Applicability::Any(items) => {
            items.iter().try_for_each(|e| check_operands(code, e))
        }
        Applicability::Not(inner) => check_operands(code, inner),
        _ => Ok(()),
    }
}
