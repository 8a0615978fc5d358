//! `tokenops policy`: policy kernel commands.
//!
//! ```bash
//! # Dry-run evaluation of a fact bag:
//! tokenops policy evaluate --issuer-country de --market EU --asset-class STABLECOIN
//!
//! # Persist requirement instances for a stored asset:
//! tokenops policy apply 5a1d0c7e-9b2f-4e3a-8c6d-1f0e2d3c4b5a --facts facts.yaml
//!
//! # Enforcement plan from persisted instances:
//! tokenops policy plan 5a1d0c7e-9b2f-4e3a-8c6d-1f0e2d3c4b5a
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use tokenops_core::{AssetClass, AssetId, Ledger};
use tokenops_policy::{
    create_requirement_instances, enforcement_plan_for_asset, evaluate_facts, DistributionType,
    FactBag, InvestorAudience, TransferType,
};

use crate::context::Context;
use crate::{check_code, print_json};

#[derive(Args, Debug)]
pub struct PolicyArgs {
    #[command(subcommand)]
    pub command: PolicyCommand,
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Evaluate a fact bag against the catalog without persisting anything.
    Evaluate(FactArgs),

    /// Evaluate facts for an asset and persist matched requirement instances.
    Apply {
        asset_id: AssetId,
        #[command(flatten)]
        facts: FactArgs,
    },

    /// Enforcement plan from an asset's persisted requirement instances.
    Plan { asset_id: AssetId },

    /// Print the active template catalog.
    Catalog,
}

/// Facts from a file, overridden field by field by flags.
#[derive(Args, Debug, Default)]
pub struct FactArgs {
    /// YAML or JSON fact bag.
    #[arg(long)]
    pub facts: Option<PathBuf>,

    /// ISO-3166 alpha-2 country of the issuer.
    #[arg(long)]
    pub issuer_country: Option<String>,

    #[arg(long, value_parser = parse_upper::<AssetClass>)]
    pub asset_class: Option<AssetClass>,

    /// Target market code; repeat for several.
    #[arg(long = "market")]
    pub markets: Vec<String>,

    #[arg(long, value_parser = parse_upper::<Ledger>)]
    pub ledger: Option<Ledger>,

    #[arg(long, value_parser = parse_upper::<DistributionType>)]
    pub distribution: Option<DistributionType>,

    #[arg(long, value_parser = parse_upper::<InvestorAudience>)]
    pub audience: Option<InvestorAudience>,

    /// A crypto-asset service provider is involved.
    #[arg(long)]
    pub casp: bool,

    #[arg(long, value_parser = parse_upper::<TransferType>)]
    pub transfer: Option<TransferType>,
}

fn parse_upper<T: FromStr>(raw: &str) -> Result<T, T::Err> {
    raw.trim().to_ascii_uppercase().parse()
}

impl FactArgs {
    pub fn to_fact_bag(&self) -> Result<FactBag> {
        let mut bag = match &self.facts {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read facts {}", path.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("failed to parse facts {}", path.display()))?
            }
            None => FactBag::new(),
        };
        if let Some(country) = &self.issuer_country {
            bag = bag.with_issuer_country(country);
        }
        if let Some(class) = self.asset_class {
            bag = bag.with_asset_class(class);
        }
        if !self.markets.is_empty() {
            bag = bag.with_target_markets(&self.markets);
        }
        if let Some(ledger) = self.ledger {
            bag = bag.with_ledger(ledger);
        }
        if let Some(distribution) = self.distribution {
            bag = bag.with_distribution(distribution);
        }
        if let Some(audience) = self.audience {
            bag = bag.with_audience(audience);
        }
        if self.casp {
            bag = bag.with_casp(true);
        }
        if let Some(transfer) = self.transfer {
            bag = bag.with_transfer_type(transfer);
        }
        Ok(bag)
    }
}

pub async fn run_policy(args: &PolicyArgs, ctx: &Context) -> Result<u8> {
    match &args.command {
        PolicyCommand::Evaluate(facts) => {
            let evaluation = evaluate_facts(&ctx.catalog, &facts.to_fact_bag()?);
            print_json(&evaluation)?;
            Ok(0)
        }
        PolicyCommand::Apply { asset_id, facts } => {
            let sync = create_requirement_instances(
                ctx.store.as_ref(),
                &ctx.catalog,
                *asset_id,
                &facts.to_fact_bag()?,
            )
            .await?;
            print_json(&sync)?;
            Ok(0)
        }
        PolicyCommand::Plan { asset_id } => {
            let plan = enforcement_plan_for_asset(ctx.store.as_ref(), &ctx.catalog, *asset_id).await?;
            print_json(&plan)?;
            Ok(check_code(!plan.issuance_blocked))
        }
        PolicyCommand::Catalog => {
            print_json(&ctx.catalog.templates())?;
            Ok(0)
        }
    }
}
