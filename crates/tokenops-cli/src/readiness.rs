//! `tokenops readiness`: asset issuance readiness.

use anyhow::Result;
use clap::Args;

use tokenops_core::AssetId;
use tokenops_policy::compute_asset_readiness;

use crate::context::Context;
use crate::{check_code, print_json};

#[derive(Args, Debug)]
pub struct ReadinessArgs {
    /// Asset to evaluate.
    pub asset_id: AssetId,
}

/// Print the readiness verdict. Exits 2 when blockers were found.
pub async fn run_readiness(args: &ReadinessArgs, ctx: &Context) -> Result<u8> {
    let result = compute_asset_readiness(ctx.store.as_ref(), args.asset_id).await?;
    print_json(&result)?;
    Ok(check_code(result.ok))
}
