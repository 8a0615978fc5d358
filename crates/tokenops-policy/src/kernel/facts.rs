//! The fact bag the kernel evaluates templates against.
//!
//! Text facts are normalised on construction: country and market codes are
//! upper-cased, markets are de-duplicated and sorted. Deserialization goes
//! through the same normalisation.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tokenops_core::{Asset, AssetClass, Fact, Ledger, ValidationError};

// ─── Fact enums ──────────────────────────────────────────────────────

/// How the token reaches its first holders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionType {
    PublicOffer,
    PrivatePlacement,
    Airdrop,
}

impl DistributionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublicOffer => "PUBLIC_OFFER",
            Self::PrivatePlacement => "PRIVATE_PLACEMENT",
            Self::Airdrop => "AIRDROP",
        }
    }
}

impl FromStr for DistributionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PUBLIC_OFFER" => Ok(Self::PublicOffer),
            "PRIVATE_PLACEMENT" => Ok(Self::PrivatePlacement),
            "AIRDROP" => Ok(Self::Airdrop),
            _ => Err(ValidationError::UnknownVariant {
                kind: "distribution type",
                value: s.to_string(),
            }),
        }
    }
}

/// Who the token is offered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestorAudience {
    Retail,
    Professional,
    Accredited,
}

impl InvestorAudience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retail => "RETAIL",
            Self::Professional => "PROFESSIONAL",
            Self::Accredited => "ACCREDITED",
        }
    }
}

impl FromStr for InvestorAudience {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RETAIL" => Ok(Self::Retail),
            "PROFESSIONAL" => Ok(Self::Professional),
            "ACCREDITED" => Ok(Self::Accredited),
            _ => Err(ValidationError::UnknownVariant {
                kind: "investor audience",
                value: s.to_string(),
            }),
        }
    }
}

/// Secondary-transfer regime of the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferType {
    Free,
    Restricted,
    Whitelist,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Restricted => "RESTRICTED",
            Self::Whitelist => "WHITELIST",
        }
    }
}

impl FromStr for TransferType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FREE" => Ok(Self::Free),
            "RESTRICTED" => Ok(Self::Restricted),
            "WHITELIST" => Ok(Self::Whitelist),
            _ => Err(ValidationError::UnknownVariant {
                kind: "transfer type",
                value: s.to_string(),
            }),
        }
    }
}

// ─── Fact bag ────────────────────────────────────────────────────────

/// Facts about an asset and its offering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawFactBag")]
pub struct FactBag {
    /// ISO-3166 alpha-2, upper-cased.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_class: Option<AssetClass>,
    /// Upper-cased, sorted, unique.
    pub target_markets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<Ledger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_type: Option<DistributionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investor_audience: Option<InvestorAudience>,
    pub involves_casp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_type: Option<TransferType>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawFactBag {
    #[serde(default)]
    issuer_country: Option<String>,
    #[serde(default)]
    asset_class: Option<AssetClass>,
    #[serde(default)]
    target_markets: Vec<String>,
    #[serde(default)]
    ledger: Option<Ledger>,
    #[serde(default)]
    distribution_type: Option<DistributionType>,
    #[serde(default)]
    investor_audience: Option<InvestorAudience>,
    #[serde(default)]
    involves_casp: bool,
    #[serde(default)]
    transfer_type: Option<TransferType>,
}

impl From<RawFactBag> for FactBag {
    fn from(raw: RawFactBag) -> Self {
        let mut bag = FactBag {
            asset_class: raw.asset_class,
            ledger: raw.ledger,
            distribution_type: raw.distribution_type,
            investor_audience: raw.investor_audience,
            involves_casp: raw.involves_casp,
            transfer_type: raw.transfer_type,
            ..FactBag::default()
        };
        if let Some(country) = raw.issuer_country {
            bag = bag.with_issuer_country(&country);
        }
        bag.with_target_markets(raw.target_markets)
    }
}

impl FactBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank country codes are dropped.
    pub fn with_issuer_country(mut self, country: &str) -> Self {
        let country = country.trim().to_ascii_uppercase();
        self.issuer_country = (!country.is_empty()).then_some(country);
        self
    }

    pub fn with_target_markets<I, S>(mut self, markets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut markets: Vec<String> = markets
            .into_iter()
            .map(|m| m.as_ref().trim().to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .collect();
        markets.sort();
        markets.dedup();
        self.target_markets = markets;
        self
    }

    pub fn with_asset_class(mut self, class: AssetClass) -> Self {
        self.asset_class = Some(class);
        self
    }

    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_distribution(mut self, distribution: DistributionType) -> Self {
        self.distribution_type = Some(distribution);
        self
    }

    pub fn with_audience(mut self, audience: InvestorAudience) -> Self {
        self.investor_audience = Some(audience);
        self
    }

    pub fn with_casp(mut self, involves_casp: bool) -> Self {
        self.involves_casp = involves_casp;
        self
    }

    pub fn with_transfer_type(mut self, transfer: TransferType) -> Self {
        self.transfer_type = Some(transfer);
        self
    }

    /// Fill `assetClass` and `ledger` from the stored asset when absent.
    pub fn with_asset_defaults(mut self, asset: &Asset) -> Self {
        self.asset_class.get_or_insert(asset.asset_class);
        self.ledger.get_or_insert(asset.ledger);
        self
    }

    /// The value of `fact`, shaped for comparison.
    pub fn value(&self, fact: Fact) -> FactValue<'_> {
        fn text(s: Option<&'static str>) -> FactValue<'static> {
            s.map_or(FactValue::Missing, FactValue::Text)
        }
        match fact {
            Fact::IssuerCountry => self
                .issuer_country
                .as_deref()
                .map_or(FactValue::Missing, FactValue::Text),
            Fact::AssetClass => text(self.asset_class.map(|c| c.as_str())),
            Fact::TargetMarkets => FactValue::List(&self.target_markets),
            Fact::Ledger => text(self.ledger.map(|l| l.as_str())),
            Fact::DistributionType => text(self.distribution_type.map(|d| d.as_str())),
            Fact::InvestorAudience => text(self.investor_audience.map(|a| a.as_str())),
            Fact::InvolvesCasp => FactValue::Bool(self.involves_casp),
            Fact::TransferType => text(self.transfer_type.map(|t| t.as_str())),
        }
    }
}

/// A fact value borrowed from a [`FactBag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Bool(bool),
    Missing,
}

impl FactValue<'_> {
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Bool(_) => "boolean",
            Self::Missing => "missing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tokenops_core::{ComplianceMode, OrganizationId};

    #[test]
    fn test_country_and_markets_are_normalised() {
        let bag = FactBag::new()
            .with_issuer_country(" de ")
            .with_target_markets(["us", "EU", "eu", " "]);
        assert_eq!(bag.issuer_country.as_deref(), Some("DE"));
        assert_eq!(bag.target_markets, vec!["EU", "US"]);
    }

    #[test]
    fn test_deserialization_normalises() {
        let bag: FactBag = serde_json::from_value(serde_json::json!({
            "issuerCountry": "fr",
            "targetMarkets": ["uk", "eu", "UK"],
            "distributionType": "PUBLIC_OFFER",
            "involvesCasp": true
        }))
        .unwrap();
        assert_eq!(bag.issuer_country.as_deref(), Some("FR"));
        assert_eq!(bag.target_markets, vec!["EU", "UK"]);
        assert_eq!(bag.distribution_type, Some(DistributionType::PublicOffer));
        assert!(bag.involves_casp);
    }

    #[test]
    fn test_unknown_fact_field_rejected() {
        let raw = serde_json::json!({ "issuerCounty": "DE" });
        assert!(serde_json::from_value::<FactBag>(raw).is_err());
    }

    #[test]
    fn test_asset_defaults_do_not_override() {
        let asset = Asset::new(
            OrganizationId::new(),
            "USD",
            "Acme Dollar",
            Ledger::Xrpl,
            ComplianceMode::GatedBefore,
            AssetClass::Stablecoin,
        )
        .unwrap();
        let bag = FactBag::new().with_asset_class(AssetClass::Equity).with_asset_defaults(&asset);
        assert_eq!(bag.asset_class, Some(AssetClass::Equity));
        assert_eq!(bag.ledger, Some(Ledger::Xrpl));
    }

    #[test]
    fn test_values_have_shapes() {
        let bag = FactBag::new().with_ledger(Ledger::Evm);
        assert_eq!(bag.value(Fact::Ledger), FactValue::Text("EVM"));
        assert_eq!(bag.value(Fact::IssuerCountry), FactValue::Missing);
        assert_eq!(bag.value(Fact::InvolvesCasp), FactValue::Bool(false));
        assert_eq!(bag.value(Fact::TargetMarkets).shape(), "list");
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("airdrop".parse::<DistributionType>().unwrap(), DistributionType::Airdrop);
        assert_eq!("Retail".parse::<InvestorAudience>().unwrap(), InvestorAudience::Retail);
        assert!("OPEN".parse::<TransferType>().is_err());
    }

    proptest! {
        #[test]
        fn test_market_normalisation_is_idempotent(markets in proptest::collection::vec("[a-zA-Z]{2}", 0..8)) {
            let once = FactBag::new().with_target_markets(&markets);
            let twice = FactBag::new().with_target_markets(&once.target_markets);
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.target_markets.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(once.target_markets.iter().all(|m| m.chars().all(|c| c.is_ascii_uppercase())));
        }
    }
}
