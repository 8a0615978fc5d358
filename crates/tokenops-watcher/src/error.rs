use thiserror::Error;

use tokenops_store::StoreError;

/// Failures that abort a watcher run or its configuration.
///
/// Ledger failures for a single issuance are counted in the run report
/// instead.
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("failed to list submitted issuances: {0}")]
    Store(#[from] StoreError),

    #[error("invalid watcher interval {value:?}: {reason}")]
    InvalidInterval { value: String, reason: String },
}
