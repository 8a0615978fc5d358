//! `tokenops require-auth`: RequireAuth flag of an issuing account.

use anyhow::{Context as _, Result};
use clap::Args;

use tokenops_core::{AssetId, Ledger, LedgerAddress};
use tokenops_policy::{check_require_auth, validate_asset_require_auth};

use crate::context::Context;
use crate::{check_code, print_json};

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RequireAuthArgs {
    /// Check the issuing address linked to this asset.
    #[arg(long)]
    pub asset: Option<AssetId>,

    /// Check a raw XRPL account address.
    #[arg(long)]
    pub address: Option<String>,
}

/// Exits 2 when the flag is not set or the check could not complete.
pub async fn run_require_auth(args: &RequireAuthArgs, ctx: &Context) -> Result<u8> {
    let ledger = ctx.ledger()?;
    let passed = match (&args.asset, &args.address) {
        (Some(asset_id), _) => {
            let result =
                validate_asset_require_auth(ctx.store.as_ref(), ledger.as_ref(), *asset_id).await;
            print_json(&result)?;
            result.has_require_auth
        }
        (None, Some(address)) => {
            let address = LedgerAddress::parse(Ledger::Xrpl, address)
                .context("invalid --address")?;
            let result = check_require_auth(ledger.as_ref(), &address).await;
            print_json(&result)?;
            result.has_require_auth
        }
        (None, None) => anyhow::bail!("one of --asset or --address is required"),
    };
    Ok(check_code(passed))
}
