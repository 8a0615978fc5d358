//! XRPL adapter configuration.
//!
//! Defaults point at the public XRPL testnet. Override via environment
//! variables or explicit construction for other networks and tests.

use url::Url;
use zeroize::Zeroizing;

/// Default JSON-RPC endpoint (public XRPL testnet).
pub const DEFAULT_RPC_URL: &str = "https://s.altnet.rippletest.net:51234";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the XRPL JSON-RPC adapter.
///
/// Custom `Debug` implementation redacts the issuer secret.
#[derive(Clone)]
pub struct XrplConfig {
    /// JSON-RPC endpoint of an XRPL node.
    pub rpc_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Seed used for sign-and-submit. Without it, submit operations fail
    /// with `LedgerError::SigningUnavailable` and read operations still work.
    pub issuer_secret: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for XrplConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrplConfig")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "issuer_secret",
                &self.issuer_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl XrplConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `XRPL_RPC_URL` (default: `https://s.altnet.rippletest.net:51234`)
    /// - `XRPL_TIMEOUT_SECS` (default: 30)
    /// - `XRPL_ISSUER_SECRET` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let rpc_url = std::env::var("XRPL_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        let timeout_secs = match std::env::var("XRPL_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("XRPL_TIMEOUT_SECS".to_string(), raw))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        let issuer_secret = std::env::var("XRPL_ISSUER_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Zeroizing::new);

        Ok(Self {
            rpc_url: parse_url("XRPL_RPC_URL", &rpc_url)?,
            timeout_secs,
            issuer_secret,
        })
    }

    /// Configuration for a given endpoint with defaults elsewhere.
    pub fn for_url(rpc_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            rpc_url: parse_url("rpc_url", rpc_url)?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            issuer_secret: None,
        })
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_issuer_secret(mut self, secret: impl Into<String>) -> Self {
        self.issuer_secret = Some(Zeroizing::new(secret.into()));
        self
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("{0} must be a non-negative integer, got {1:?}")]
    InvalidNumber(String, String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
