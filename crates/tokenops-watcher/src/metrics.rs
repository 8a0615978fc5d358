//! Watcher metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! binary installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, gauge};

pub const RUNS_TOTAL: &str = "tokenops_watcher_runs_total";
pub const RUN_FAILURES_TOTAL: &str = "tokenops_watcher_run_failures_total";
pub const RECONCILED_TOTAL: &str = "tokenops_issuances_reconciled_total";
pub const PENDING_ISSUANCES: &str = "tokenops_watcher_pending_issuances";

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    describe_counter!(RUNS_TOTAL, "Watcher runs started");
    describe_counter!(RUN_FAILURES_TOTAL, "Watcher runs aborted by a store failure");
    describe_counter!(
        RECONCILED_TOTAL,
        "Issuances examined by the watcher, by outcome"
    );
    describe_gauge!(
        PENDING_ISSUANCES,
        "SUBMITTED issuances seen at the start of the last run"
    );
}

pub(crate) fn run_started() {
    counter!(RUNS_TOTAL).increment(1);
}

pub(crate) fn run_failed() {
    counter!(RUN_FAILURES_TOTAL).increment(1);
}

pub(crate) fn pending(count: usize) {
    gauge!(PENDING_ISSUANCES).set(count as f64);
}

pub(crate) fn reconciled(outcome: &'static str) {
    counter!(RECONCILED_TOTAL, "outcome" => outcome).increment(1);
}
