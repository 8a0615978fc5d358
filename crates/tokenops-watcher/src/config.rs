//! Watcher configuration from the environment.

use std::time::Duration;

use crate::error::WatcherError;
use crate::scheduler::DEFAULT_INTERVAL;

pub const INTERVAL_ENV: &str = "TOKENOPS_WATCHER_INTERVAL_SECS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherConfig {
    pub interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl WatcherConfig {
    /// Read `TOKENOPS_WATCHER_INTERVAL_SECS`, defaulting to 10 seconds.
    pub fn from_env() -> Result<Self, WatcherError> {
        match std::env::var(INTERVAL_ENV) {
            Ok(raw) => Ok(Self {
                interval: parse_interval(&raw)?,
            }),
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Parse a whole number of seconds. Zero is rejected.
pub fn parse_interval(raw: &str) -> Result<Duration, WatcherError> {
    let invalid = |reason: &str| WatcherError::InvalidInterval {
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number of seconds"))?;
    if secs == 0 {
        return Err(invalid("interval must be at least one second"));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_seconds() {
        assert_eq!(parse_interval("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval(" 5 ").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_zero_and_garbage() {
        assert!(matches!(
            parse_interval("0"),
            Err(WatcherError::InvalidInterval { .. })
        ));
        assert!(parse_interval("ten").is_err());
        assert!(parse_interval("-1").is_err());
    }

    #[test]
    fn test_default_is_ten_seconds() {
        assert_eq!(WatcherConfig::default().interval, Duration::from_secs(10));
    }
}
