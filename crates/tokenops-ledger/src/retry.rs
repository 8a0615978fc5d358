//! Backoff for ledger JSON-RPC transport failures.
//!
//! The closure is retried only when it returns `Err`, i.e. when no HTTP
//! response arrived at all. Error statuses and JSON-RPC `error` results are
//! answers from the node and go straight back to the caller.

use std::future::Future;
use std::time::Duration;

/// Attempts after the first one.
pub(crate) const MAX_RETRIES: u32 = 3;

const FIRST_DELAY: Duration = Duration::from_millis(200);

/// 200 ms, 400 ms, 800 ms, ...
pub(crate) fn backoff_delay(retry: u32) -> Duration {
    FIRST_DELAY * 2u32.saturating_pow(retry)
}

pub(crate) async fn with_backoff<T, E, F, Fut>(rpc_method: &str, mut attempt: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retry = 0;
    loop {
        match attempt().await {
            Err(e) if retry < MAX_RETRIES => {
                let delay = backoff_delay(retry);
                retry += 1;
                tracing::warn!(
                    method = rpc_method,
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "ledger RPC transport failure"
                );
                tokio::time::sleep(delay).await;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_delays_double() {
        let delays: Vec<u128> = (0..MAX_RETRIES).map(|r| backoff_delay(r).as_millis()).collect();
        assert_eq!(delays, vec![200, 400, 800]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = Cell::new(0u32);
        let result: Result<(), String> = with_backoff("tx", || {
            calls.set(calls.get() + 1);
            async { Err("connection refused".to_string()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), MAX_RETRIES + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_a_transient_failure() {
        let calls = Cell::new(0u32);
        let result: Result<u32, String> = with_backoff("ledger", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 2 {
                    Err("timed out".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(2));
    }
}
