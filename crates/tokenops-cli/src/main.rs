//! # tokenops CLI entry point
//!
//! Parses arguments, initializes logging and metrics, builds the shared
//! context, and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tokenops_cli::context::{Context, GlobalArgs};
use tokenops_cli::policy::{run_policy, PolicyArgs};
use tokenops_cli::readiness::{run_readiness, ReadinessArgs};
use tokenops_cli::require_auth::{run_require_auth, RequireAuthArgs};
use tokenops_cli::telemetry;
use tokenops_cli::watch::{run_watch, WatchArgs};

/// TokenOps: issuance readiness, compliance gating, and issuance
/// reconciliation for ledger-issued tokens.
#[derive(Parser, Debug)]
#[command(name = "tokenops", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile submitted issuances against the ledger on a fixed interval.
    Watch(WatchArgs),

    /// Evaluate whether an asset is ready for issuance.
    Readiness(ReadinessArgs),

    /// Check the RequireAuth flag of an issuing account.
    RequireAuth(RequireAuthArgs),

    /// Regulatory policy kernel: evaluate, apply, plan, catalog.
    Policy(PolicyArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.global.log_format, cli.global.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    if let Some(addr) = cli.global.metrics_addr {
        telemetry::install_metrics(addr)?;
    }
    let ctx = Context::from_args(&cli.global).await?;

    match &cli.command {
        Commands::Watch(args) => run_watch(args, &ctx).await,
        Commands::Readiness(args) => run_readiness(args, &ctx).await,
        Commands::RequireAuth(args) => run_require_auth(args, &ctx).await,
        Commands::Policy(args) => run_policy(args, &ctx).await,
    }
}
