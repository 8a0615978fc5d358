//! # tokenops-cli: The `tokenops` Command-Line Tool
//!
//! ## Subcommands
//!
//! - `tokenops watch`: run the issuance status watcher until Ctrl-C
//!   (`--once` for a single pass).
//! - `tokenops readiness <ASSET_ID>`: evaluate issuance readiness.
//! - `tokenops require-auth`: check the RequireAuth flag of an asset's
//!   issuing account or of a raw address.
//! - `tokenops policy evaluate|apply|plan|catalog`: the policy kernel.
//!
//! ```bash
//! TOKENOPS_FIXTURES=demos/fixtures.yaml tokenops readiness 5a1d0c7e-9b2f-4e3a-8c6d-1f0e2d3c4b5a
//! tokenops policy evaluate --market EU --asset-class STABLECOIN --distribution PUBLIC_OFFER
//! DATABASE_URL=postgres://localhost/tokenops tokenops watch --interval-secs 10
//! ```
//!
//! Results print to stdout as pretty JSON; logs go to stderr.
//!
//! ## Exit codes
//!
//! `0` success, `1` error, `2` the check ran but the asset is not ready
//! (readiness blockers, RequireAuth unset, or a blocked enforcement plan).

pub mod context;
pub mod policy;
pub mod readiness;
pub mod require_auth;
pub mod telemetry;
pub mod watch;

use serde::Serialize;

/// Exit code for a check that ran and did not pass.
pub const EXIT_NOT_READY: u8 = 2;

/// Print `value` to stdout as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `0` when `passed`, else [`EXIT_NOT_READY`].
pub fn check_code(passed: bool) -> u8 {
    if passed {
        0
    } else {
        EXIT_NOT_READY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_codes() {
        assert_eq!(check_code(true), 0);
        assert_eq!(check_code(false), EXIT_NOT_READY);
    }
}
