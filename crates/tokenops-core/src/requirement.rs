//! # Regulatory Requirements
//!
//! A [`RequirementTemplate`] is a reusable regulatory rule: a stable code,
//! the regime it comes from, when it must be enforced, and an
//! [`Applicability`] expression deciding which assets it applies to.
//! A [`RequirementInstance`] is the application of one template to one
//! asset; instances are unique per `(asset_id, template_id)`.
//!
//! Expressions are plain data here so every crate can store and ship them.
//! Evaluation against a fact bag lives in `tokenops-policy`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{AssetId, RequirementInstanceId, TemplateId};
use crate::temporal::Timestamp;

// ─── Regime ──────────────────────────────────────────────────────────

/// The regulatory framework a requirement comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    /// EU Markets in Crypto-Assets Regulation.
    EuMica,
    /// EU Prospectus Regulation.
    EuProspectus,
    /// US securities law (Securities Act / Exchange Act).
    UsSec,
    /// UK Financial Conduct Authority rules.
    UkFca,
    /// FATF recommendations (travel rule, AML/CFT).
    Fatf,
    /// Ledger-level control configuration.
    LedgerControls,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EuMica => "EU_MICA",
            Self::EuProspectus => "EU_PROSPECTUS",
            Self::UsSec => "US_SEC",
            Self::UkFca => "UK_FCA",
            Self::Fatf => "FATF",
            Self::LedgerControls => "LEDGER_CONTROLS",
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EU_MICA" => Ok(Self::EuMica),
            "EU_PROSPECTUS" => Ok(Self::EuProspectus),
            "US_SEC" => Ok(Self::UsSec),
            "UK_FCA" => Ok(Self::UkFca),
            "FATF" => Ok(Self::Fatf),
            "LEDGER_CONTROLS" => Ok(Self::LedgerControls),
            other => Err(ValidationError::UnknownVariant {
                kind: "regime",
                value: other.to_string(),
            }),
        }
    }
}

// ─── Enforcement ─────────────────────────────────────────────────────

/// When a requirement must be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnforcementLevel {
    /// Blocks issuance until satisfied or waived.
    BeforeIssuance,
    /// Must be met before holders can transfer.
    BeforeTransfer,
    /// Informational only.
    Advisory,
}

impl EnforcementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeIssuance => "BEFORE_ISSUANCE",
            Self::BeforeTransfer => "BEFORE_TRANSFER",
            Self::Advisory => "ADVISORY",
        }
    }
}

impl std::fmt::Display for EnforcementLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnforcementLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BEFORE_ISSUANCE" => Ok(Self::BeforeIssuance),
            "BEFORE_TRANSFER" => Ok(Self::BeforeTransfer),
            "ADVISORY" => Ok(Self::Advisory),
            other => Err(ValidationError::UnknownVariant {
                kind: "enforcement level",
                value: other.to_string(),
            }),
        }
    }
}

// ─── Requirement status ──────────────────────────────────────────────

/// Progress of a requirement instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementStatus {
    Pending,
    Satisfied,
    Waived,
}

impl RequirementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Satisfied => "SATISFIED",
            Self::Waived => "WAIVED",
        }
    }

    /// Satisfied and waived requirements no longer block anything.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Satisfied | Self::Waived)
    }
}

impl std::fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SATISFIED" => Ok(Self::Satisfied),
            "WAIVED" => Ok(Self::Waived),
            other => Err(ValidationError::UnknownVariant {
                kind: "requirement status",
                value: other.to_string(),
            }),
        }
    }
}

// ─── Facts and applicability ─────────────────────────────────────────

/// Names of the facts an applicability expression can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Fact {
    IssuerCountry,
    AssetClass,
    TargetMarkets,
    Ledger,
    DistributionType,
    InvestorAudience,
    InvolvesCasp,
    TransferType,
}

impl Fact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssuerCountry => "issuerCountry",
            Self::AssetClass => "assetClass",
            Self::TargetMarkets => "targetMarkets",
            Self::Ledger => "ledger",
            Self::DistributionType => "distributionType",
            Self::InvestorAudience => "investorAudience",
            Self::InvolvesCasp => "involvesCasp",
            Self::TransferType => "transferType",
        }
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean expression over a fact bag.
///
/// Serialized externally tagged in snake case, so a catalog file reads:
///
/// ```yaml
/// applicability:
///   all:
///     - includes: { fact: targetMarkets, value: EU }
///     - not: { equals: { fact: assetClass, value: EQUITY } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    /// Matches every asset.
    Always,
    /// Matches when every sub-expression matches.
    All(Vec<Applicability>),
    /// Matches when at least one sub-expression matches.
    Any(Vec<Applicability>),
    Not(Box<Applicability>),
    /// Scalar fact equals `value`.
    Equals { fact: Fact, value: serde_json::Value },
    /// Scalar fact is one of `values`.
    OneOf {
        fact: Fact,
        values: Vec<serde_json::Value>,
    },
    /// List fact contains `value`.
    Includes { fact: Fact, value: serde_json::Value },
    /// List fact shares at least one element with `values`.
    Intersects {
        fact: Fact,
        values: Vec<serde_json::Value>,
    },
    /// Boolean fact is `true`.
    IsTrue { fact: Fact },
}

impl std::fmt::Display for Applicability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut std::fmt::Formatter<'_>, op: &str, items: &[Applicability]) -> std::fmt::Result {
            f.write_str("(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str(")")
        }
        let list = |values: &[serde_json::Value]| {
            values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
        };
        match self {
            Self::Always => f.write_str("always"),
            Self::All(items) => join(f, "AND", items),
            Self::Any(items) => join(f, "OR", items),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::Equals { fact, value } => write!(f, "{fact} == {value}"),
            Self::OneOf { fact, values } => write!(f, "{fact} in [{}]", list(values)),
            Self::Includes { fact, value } => write!(f, "{fact} contains {value}"),
            Self::Intersects { fact, values } => {
                write!(f, "{fact} intersects [{}]", list(values))
            }
            Self::IsTrue { fact } => write!(f, "{fact} is true"),
        }
    }
}

// ─── Template and instance ───────────────────────────────────────────

/// A reusable regulatory rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementTemplate {
    pub id: TemplateId,
    /// Stable human-readable code, e.g. `MICA_WHITEPAPER`.
    pub code: String,
    pub regime: Regime,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enforcement: EnforcementLevel,
    /// Lower runs first within an enforcement stage.
    #[serde(default)]
    pub priority: u32,
    pub applicability: Applicability,
}

/// One template applied to one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementInstance {
    pub id: RequirementInstanceId,
    pub asset_id: AssetId,
    pub template_id: TemplateId,
    pub template_code: String,
    pub status: RequirementStatus,
    /// Why the template matched, recorded at creation.
    pub rationale: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RequirementInstance {
    /// A new `PENDING` instance of `template` for `asset_id`.
    pub fn pending(asset_id: AssetId, template: &RequirementTemplate, rationale: String) -> Self {
        let now = Timestamp::now();
        Self {
            id: RequirementInstanceId::new(),
            asset_id,
            template_id: template.id,
            template_code: template.code.clone(),
            status: RequirementStatus::Pending,
            rationale,
            created_at: now,
            updated_at: now,
        }
    }
}
