//! One reconciliation pass over submitted issuances.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use tokenops_ledger::{LedgerAdapter, LedgerError, TxLookup};
use tokenops_state::{Issuance, IssuanceStatus, IssuanceTransition, TES_SUCCESS};
use tokenops_store::Store;

use crate::error::WatcherError;
use crate::metrics;
use crate::scheduler::Job;

/// Counts from one watcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherRunReport {
    /// Issuances examined.
    pub checked: usize,
    pub confirmed: usize,
    pub failed: usize,
    /// Still pending on the ledger, or not found before expiry.
    pub unchanged: usize,
    /// Ledger or store failures for individual issuances.
    pub errors: usize,
    /// Already final, either when listed or by the time we wrote.
    pub skipped_terminal: usize,
}

enum Outcome {
    Confirmed,
    Failed,
    Unchanged,
    Error,
    SkippedTerminal,
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::Unchanged => "unchanged",
            Self::Error => "error",
            Self::SkippedTerminal => "skipped_terminal",
        }
    }
}

impl WatcherRunReport {
    fn record(&mut self, outcome: &Outcome) {
        self.checked += 1;
        match outcome {
            Outcome::Confirmed => self.confirmed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Error => self.errors += 1,
            Outcome::SkippedTerminal => self.skipped_terminal += 1,
        }
    }
}

/// Reconcile every `SUBMITTED` issuance against the ledger.
///
/// Only a failure to list issuances aborts the run. Per-issuance failures
/// are logged, counted in `errors`, and the run moves on.
pub async fn run_watcher_job(
    store: &dyn Store,
    ledger: &dyn LedgerAdapter,
) -> Result<WatcherRunReport, WatcherError> {
    metrics::run_started();
    let issuances = match store.list_issuances(Some(IssuanceStatus::Submitted)).await {
        Ok(issuances) => issuances,
        Err(e) => {
            metrics::run_failed();
            return Err(e.into());
        }
    };
    metrics::pending(issuances.len());

    let mut latest = LatestLedger::default();
    let mut report = WatcherRunReport::default();
    for mut issuance in issuances {
        let outcome = reconcile(store, ledger, &mut latest, &mut issuance).await;
        metrics::reconciled(outcome.label());
        report.record(&outcome);
    }

    tracing::info!(
        checked = report.checked,
        confirmed = report.confirmed,
        failed = report.failed,
        unchanged = report.unchanged,
        errors = report.errors,
        skipped_terminal = report.skipped_terminal,
        "watcher run complete"
    );
    Ok(report)
}

/// The latest validated ledger index, fetched at most once per run and
/// only when an issuance needs an expiry check.
#[derive(Default)]
struct LatestLedger(Option<u32>);

impl LatestLedger {
    async fn get(&mut self, ledger: &dyn LedgerAdapter) -> Result<u32, LedgerError> {
        if let Some(index) = self.0 {
            return Ok(index);
        }
        let index = ledger.latest_validated_ledger().await?;
        self.0 = Some(index);
        Ok(index)
    }
}

async fn reconcile(
    store: &dyn Store,
    ledger: &dyn LedgerAdapter,
    latest: &mut LatestLedger,
    issuance: &mut Issuance,
) -> Outcome {
    if issuance.is_terminal() {
        return Outcome::SkippedTerminal;
    }

    let lookup = match ledger.transaction_status(&issuance.tx_hash).await {
        Ok(lookup) => lookup,
        Err(e) => {
            tracing::warn!(
                issuance_id = %issuance.id,
                tx_hash = %issuance.tx_hash,
                error = %e,
                "transaction lookup failed"
            );
            return Outcome::Error;
        }
    };

    let transition = match lookup {
        TxLookup::Validated {
            result_code,
            ledger_index,
        } if result_code == TES_SUCCESS => issuance.confirm(result_code, Some(ledger_index)),
        TxLookup::Validated {
            result_code,
            ledger_index,
        } => issuance.fail(Some(result_code), Some(ledger_index), None),
        TxLookup::NotFound => {
            let Some(lls) = issuance.last_ledger_sequence else {
                return Outcome::Unchanged;
            };
            let latest = match latest.get(ledger).await {
                Ok(index) => index,
                Err(e) => {
                    tracing::warn!(
                        issuance_id = %issuance.id,
                        error = %e,
                        "failed to read latest validated ledger"
                    );
                    return Outcome::Error;
                }
            };
            if !issuance.is_expired_at(latest) {
                return Outcome::Unchanged;
            }
            tracing::debug!(
                issuance_id = %issuance.id,
                last_ledger_sequence = lls,
                latest_validated = latest,
                "transaction expired"
            );
            issuance.expire()
        }
        TxLookup::Pending => return Outcome::Unchanged,
    };

    let transition = match transition {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(issuance_id = %issuance.id, error = %e, "transition rejected");
            return Outcome::SkippedTerminal;
        }
    };

    persist(store, issuance, transition).await
}

async fn persist(store: &dyn Store, issuance: &Issuance, transition: IssuanceTransition) -> Outcome {
    match store.update_issuance_if_submitted(issuance).await {
        Ok(true) => {
            tracing::info!(
                issuance_id = %issuance.id,
                asset_id = %issuance.asset_id,
                from = %transition.from_status,
                to = %transition.to_status,
                reason = %transition.reason,
                "issuance finalized"
            );
            match transition.to_status {
                IssuanceStatus::Confirmed => Outcome::Confirmed,
                _ => Outcome::Failed,
            }
        }
        Ok(false) => {
            tracing::debug!(
                issuance_id = %issuance.id,
                "issuance already finalized by another run"
            );
            Outcome::SkippedTerminal
        }
        Err(e) => {
            tracing::warn!(issuance_id = %issuance.id, error = %e, "failed to persist issuance");
            Outcome::Error
        }
    }
}

/// The watcher bound to its store and ledger, for the scheduler.
#[derive(Clone)]
pub struct IssuanceWatcher {
    store: Arc<dyn Store>,
    ledger: Arc<dyn LedgerAdapter>,
}

impl IssuanceWatcher {
    pub fn new(store: Arc<dyn Store>, ledger: Arc<dyn LedgerAdapter>) -> Self {
        Self { store, ledger }
    }
}

impl std::fmt::Debug for IssuanceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuanceWatcher")
            .field("ledger", &self.ledger.ledger())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Job for IssuanceWatcher {
    fn name(&self) -> &str {
        "issuance-watcher"
    }

    async fn run(&self) -> Result<WatcherRunReport, WatcherError> {
        run_watcher_job(self.store.as_ref(), self.ledger.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenops_core::{AssetId, IssuanceId};
    use tokenops_ledger::MockLedger;
    use tokenops_state::EXPIRED_REASON;
    use tokenops_store::MemoryStore;

    const DEST: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";

    async fn submit(store: &MemoryStore, hash: &str, lls: Option<u32>) -> IssuanceId {
        let issuance = Issuance::submitted(AssetId::new(), "100", DEST, hash, lls).unwrap();
        store.insert_issuance(&issuance).await.unwrap();
        issuance.id
    }

    async fn status(store: &MemoryStore, id: IssuanceId) -> Issuance {
        store.get_issuance(id).await.unwrap().unwrap()
    }

    fn validated(code: &str, index: u32) -> TxLookup {
        TxLookup::Validated {
            result_code: code.to_string(),
            ledger_index: index,
        }
    }

    #[tokio::test]
    async fn test_success_confirms() {
        let store = MemoryStore::new();
        let ledger = MockLedger::default();
        let id = submit(&store, "AA", Some(100)).await;
        ledger.set_tx("AA", validated("tesSUCCESS", 90));

        let report = run_watcher_job(&store, &ledger).await.unwrap();
        assert_eq!(report.confirmed, 1);
        assert_eq!(report.checked, 1);

        let issuance = status(&store, id).await;
        assert_eq!(issuance.status, IssuanceStatus::Confirmed);
        assert_eq!(issuance.result_code.as_deref(), Some("tesSUCCESS"));
        assert_eq!(issuance.ledger_index, Some(90));
        assert!(issuance.finalized_at.is_some());
    }

    #[tokio::test]
    async fn test_other_result_fails() {
        let store = MemoryStore::new();
        let ledger = MockLedger::default();
        let id = submit(&store, "BB", Some(100)).await;
        ledger.set_tx("BB", validated("tecNO_AUTH", 91));

        let report = run_watcher_job(&store, &ledger).await.unwrap();
        assert_eq!(report.failed, 1);
        let issuance = status(&store, id).await;
        assert_eq!(issuance.status, IssuanceStatus::Failed);
        assert_eq!(issuance.result_code.as_deref(), Some("tecNO_AUTH"));
        assert_eq!(issuance.failure_reason.as_deref(), Some("tecNO_AUTH"));
    }

    #[tokio::test]
    async fn test_not_found_past_lls_expires() {
        let store = MemoryStore::new();
        let ledger = MockLedger::default();
        let id = submit(&store, "CC", Some(100)).await;
        ledger.set_latest_validated(101);

        let report = run_watcher_job(&store, &ledger).await.unwrap();
        assert_eq!(report.failed, 1);
        let issuance = status(&store, id).await;
        assert_eq!(issuance.status, IssuanceStatus::Failed);
        assert_eq!(issuance.failure_reason.as_deref(), Some(EXPIRED_REASON));
        assert!(issuance.result_code.is_none());
    }

    #[tokio::test]
    async fn test_not_found_within_window_is_unchanged() {
        let store = MemoryStore::new();
        let ledger = MockLedger::default();
        let at_limit = submit(&store, "DD", Some(100)).await;
        let no_lls = submit(&store, "EE", None).await;
        ledger.set_latest_validated(100);

        let report = run_watcher_job(&store, &ledger).await.unwrap();
        assert_eq!(report.unchanged, 2);
        assert_eq!(status(&store, at_limit).await.status, IssuanceStatus::Submitted);
        assert_eq!(status(&store, no_lls).await.status, IssuanceStatus::Submitted);
    }

    #[tokio::test]
    async fn test_pending_is_unchanged() {
        let store = MemoryStore::new();
        let ledger = MockLedger::default();
        let id = submit(&store, "FF", Some(100)).await;
        ledger.set_tx("FF", TxLookup::Pending);
        ledger.set_latest_validated(500);

        let report = run_watcher_job(&store, &ledger).await.unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(status(&store, id).await.status, IssuanceStatus::Submitted);
    }

    #[tokio::test]
    async fn test_one_lookup_error_does_not_stop_the_run() {
        let store = MemoryStore::new();
        let ledger = MockLedger::default();
        let broken = submit(&store, "01", Some(100)).await;
        let ok = submit(&store, "02", Some(100)).await;
        ledger.fail_tx("01");
        ledger.set_tx("02", validated("tesSUCCESS", 95));

        let report = run_watcher_job(&store, &ledger).await.unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(report.confirmed, 1);
        assert_eq!(status(&store, broken).await.status, IssuanceStatus::Submitted);
        assert_eq!(status(&store, ok).await.status, IssuanceStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_confirmed_issuance_is_left_alone() {
        let store = MemoryStore::new();
        let ledger = MockLedger::default();
        let id = submit(&store, "AB", Some(100)).await;
        ledger.set_tx("AB", validated("tesSUCCESS", 90));
        run_watcher_job(&store, &ledger).await.unwrap();
        let confirmed = status(&store, id).await;

        ledger.set_tx("AB", validated("tecNO_AUTH", 99));
        let report = run_watcher_job(&store, &ledger).await.unwrap();
        assert_eq!(report.checked, 0);
        assert_eq!(status(&store, id).await, confirmed);
    }

    #[tokio::test]
    async fn test_lost_race_writes_nothing() {
        let store = MemoryStore::new();
        let ledger = MockLedger::default();
        let id = submit(&store, "AC", Some(100)).await;

        // Another run finalized the row after this run listed it.
        let mut listed = status(&store, id).await;
        let mut other = listed.clone();
        other.fail(Some("tecNO_AUTH".into()), Some(88), None).unwrap();
        assert!(store.update_issuance_if_submitted(&other).await.unwrap());

        ledger.set_tx("AC", validated("tesSUCCESS", 90));
        let mut latest = LatestLedger::default();
        let outcome = reconcile(&store, &ledger, &mut latest, &mut listed).await;
        assert!(matches!(outcome, Outcome::SkippedTerminal));
        assert_eq!(status(&store, id).await.status, IssuanceStatus::Failed);
    }

    #[tokio::test]
    async fn test_latest_ledger_fetched_once() {
        let store = MemoryStore::new();
        let ledger = MockLedger::default();
        for hash in ["A1", "A2", "A3"] {
            submit(&store, hash, Some(10)).await;
        }
        ledger.set_latest_validated(5);

        run_watcher_job(&store, &ledger).await.unwrap();
        // Three lookups plus one ledger query.
        assert_eq!(ledger.call_count(), 4);
    }

    #[tokio::test]
    async fn test_watcher_job_trait() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(MockLedger::default());
        submit(&store, "B1", Some(100)).await;
        ledger.set_tx("B1", validated("tesSUCCESS", 1));

        let watcher = IssuanceWatcher::new(store.clone(), ledger);
        assert_eq!(watcher.name(), "issuance-watcher");
        let report = watcher.run().await.unwrap();
        assert_eq!(report.confirmed, 1);
    }

    #[test]
    fn test_report_json_shape() {
        let report = WatcherRunReport {
            checked: 2,
            skipped_terminal: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["checked"], 2);
        assert_eq!(json["skippedTerminal"], 1);
    }
}
