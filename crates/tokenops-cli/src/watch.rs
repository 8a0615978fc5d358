//! `tokenops watch`: the issuance status watcher.

use std::future::Future;

use anyhow::Result;
use clap::Args;
use tokio::sync::watch;

use tokenops_watcher::config::parse_interval;
use tokenops_watcher::{run_scheduler, run_watcher_job, IssuanceWatcher, WatcherConfig};

use crate::context::Context;
use crate::print_json;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Run a single reconciliation pass, print its report, and exit.
    #[arg(long)]
    pub once: bool,

    /// Seconds between runs; overrides TOKENOPS_WATCHER_INTERVAL_SECS.
    #[arg(long, value_parser = parse_interval)]
    pub interval_secs: Option<std::time::Duration>,
}

pub async fn run_watch(args: &WatchArgs, ctx: &Context) -> Result<u8> {
    let ledger = ctx.ledger()?;

    if args.once {
        let report = run_watcher_job(ctx.store.as_ref(), ledger.as_ref()).await?;
        print_json(&report)?;
        return Ok(0);
    }

    let interval = match args.interval_secs {
        Some(interval) => interval,
        None => WatcherConfig::from_env()?.interval,
    };
    let watcher = IssuanceWatcher::new(ctx.store.clone(), ledger);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(forward_shutdown(tokio::signal::ctrl_c(), shutdown_tx));

    let stats = run_scheduler(&watcher, interval, shutdown_rx).await;
    tracing::info!(runs = stats.runs, failures = stats.failures, "watcher exited");
    Ok(0)
}

/// Request shutdown once `signal` fires.
///
/// If the signal cannot be listened for, the sender is held forever: the
/// scheduler treats a dropped sender as shutdown too.
async fn forward_shutdown(
    signal: impl Future<Output = std::io::Result<()>>,
    shutdown_tx: watch::Sender<bool>,
) {
    match signal.await {
        Ok(()) => {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl-C, watcher keeps running");
            std::future::pending::<()>().await;
        }
    }
}
