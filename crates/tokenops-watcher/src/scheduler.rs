//! Fixed-interval scheduler.
//!
//! Runs the job once immediately, then every `interval`. A run that
//! overshoots its slot delays the following ticks instead of bursting to
//! catch up. Shutdown is checked between runs; a run in flight finishes.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::WatcherError;
use crate::job::WatcherRunReport;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// A unit of periodic work.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> Result<WatcherRunReport, WatcherError>;
}

/// Counts kept by the scheduler for its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub runs: u64,
    pub failures: u64,
}

/// Run `job` until `shutdown` turns `true` or its sender is dropped.
pub async fn run_scheduler(
    job: &dyn Job,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> SchedulerStats {
    let mut stats = SchedulerStats::default();
    if *shutdown.borrow() {
        return stats;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(job = job.name(), interval_secs = interval.as_secs(), "scheduler started");

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                stats.runs += 1;
                if let Err(e) = job.run().await {
                    stats.failures += 1;
                    tracing::error!(job = job.name(), error = %e, "scheduled run failed");
                }
            }
        }
    }

    tracing::info!(
        job = job.name(),
        runs = stats.runs,
        failures = stats.failures,
        "scheduler stopped"
    );
    stats
}
