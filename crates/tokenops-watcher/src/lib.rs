//! # tokenops-watcher: Issuance Status Watcher
//!
//! Re-checks issuances that were submitted to the ledger but are not yet
//! final, and records the outcome.
//!
//! ```text
//!   scheduler ──tick──▶ run_watcher_job(store, ledger)
//!                         │
//!                         ├── list SUBMITTED issuances
//!                         ├── per issuance: transaction_status(tx_hash)
//!                         │     VALIDATED tesSUCCESS ─▶ CONFIRMED
//!                         │     VALIDATED other      ─▶ FAILED(result code)
//!                         │     NOT_FOUND past LLS   ─▶ FAILED(EXPIRED)
//!                         │     otherwise            ─▶ unchanged
//!                         └── update_issuance_if_submitted
//! ```
//!
//! Overlapping runs are safe: the store only writes a finalized issuance if
//! its row is still `SUBMITTED`. No locks are taken.

pub mod config;
pub mod error;
pub mod job;
pub mod metrics;
pub mod scheduler;

pub use config::WatcherConfig;
pub use error::WatcherError;
pub use job::{run_watcher_job, IssuanceWatcher, WatcherRunReport};
pub use scheduler::{run_scheduler, Job, SchedulerStats, DEFAULT_INTERVAL};
