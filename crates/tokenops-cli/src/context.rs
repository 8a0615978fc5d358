//! Shared handles built from global options and the environment.
//!
//! Flags win over environment variables; clap reads the `env` fallbacks.
//! The XRPL adapter is only built for commands that talk to the ledger.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Args;

use tokenops_ledger::{LedgerAdapter, XrplConfig, XrplJsonRpcAdapter};
use tokenops_policy::Catalog;
use tokenops_store::{Fixtures, MemoryStore, PgStore, Store};

use crate::telemetry::LogFormat;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// PostgreSQL connection string. Without it an in-memory store is used.
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// YAML fixtures to seed the in-memory store with.
    #[arg(long, env = "TOKENOPS_FIXTURES", global = true)]
    pub fixtures: Option<PathBuf>,

    /// Policy catalog file replacing the built-in templates.
    #[arg(long, env = "TOKENOPS_POLICY_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "TOKENOPS_METRICS_ADDR", global = true)]
    pub metrics_addr: Option<SocketAddr>,

    /// XRPL JSON-RPC endpoint; overrides XRPL_RPC_URL.
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    #[arg(long, env = "TOKENOPS_LOG_FORMAT", value_enum, default_value_t, global = true)]
    pub log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Store, catalog, and ledger configuration for one invocation.
pub struct Context {
    pub store: Arc<dyn Store>,
    pub catalog: Catalog,
    rpc_url: Option<String>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("templates", &self.catalog.len())
            .field("rpc_url", &self.rpc_url)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub async fn from_args(args: &GlobalArgs) -> anyhow::Result<Self> {
        Ok(Self {
            store: open_store(args).await?,
            catalog: load_catalog(args)?,
            rpc_url: args.rpc_url.clone(),
        })
    }

    /// A context over an existing store, with the built-in catalog.
    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            catalog: Catalog::builtin(),
            rpc_url: None,
        }
    }

    /// Build the XRPL adapter from `XRPL_*` variables and `--rpc-url`.
    pub fn ledger(&self) -> anyhow::Result<Arc<dyn LedgerAdapter>> {
        let mut config = XrplConfig::from_env().context("invalid XRPL configuration")?;
        if let Some(url) = &self.rpc_url {
            config.rpc_url = XrplConfig::for_url(url).context("invalid --rpc-url")?.rpc_url;
        }
        tracing::debug!(?config, "xrpl adapter configured");
        let adapter = XrplJsonRpcAdapter::new(&config).context("failed to build XRPL adapter")?;
        Ok(Arc::new(adapter))
    }
}

async fn open_store(args: &GlobalArgs) -> anyhow::Result<Arc<dyn Store>> {
    if let Some(url) = &args.database_url {
        let store = PgStore::connect(url)
            .await
            .context("failed to connect to PostgreSQL")?;
        tracing::info!("using PostgreSQL store");
        return Ok(Arc::new(store));
    }

    let store = match &args.fixtures {
        Some(path) => {
            let fixtures = Fixtures::load(path)
                .with_context(|| format!("failed to load fixtures {}", path.display()))?;
            tracing::info!(path = %path.display(), "using in-memory store seeded from fixtures");
            MemoryStore::from_fixtures(fixtures)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using an empty in-memory store");
            MemoryStore::new()
        }
    };
    Ok(Arc::new(store))
}

fn load_catalog(args: &GlobalArgs) -> anyhow::Result<Catalog> {
    match &args.catalog {
        Some(path) => Catalog::load(path).context("failed to load policy catalog"),
        None => Ok(Catalog::builtin()),
    }
}
