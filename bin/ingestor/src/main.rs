//! Process entry point (§6 "Process interface"). Wires the two entry
//! points `ingestor::ingest_once`/`ingestor::start_live_monitor` to
//! concrete transports and a CLI. Pool/address selection is normally the
//! store's job (§1: upstream config loading is out of scope); this binary
//! accepts the minimal set of flags needed to run either path standalone.

use std::{collections::HashSet, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use ingest_adapters::{test_support::InMemoryStore, HttpRpcClient, TransactionsApiClient};
use ingest_live::{LiveMonitorConfig, LiveMonitorTuning, TungsteniteConnector};
use ingest_supervisor::{ActivePool, IngestionSupervisor};
use ingest_types::{Address, GenericPoolConfig, ProtocolFamily};
use ingestor::config::IngestorConfig;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[clap(about = "Pool-activity ingestion and reconciliation engine")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs one polling round (§4.6/§4.7) against a single pool.
    Poll {
        pool_address: String,
        base_mint: String,
        quote_mint: String,
        base_vault: String,
        quote_vault: String,
        #[clap(long, value_enum, default_value = "bonding-curve")]
        family: Family,
        #[clap(long)]
        successor_address: Option<String>,
    },
    /// Starts the live WebSocket monitor (§4.8) for one address until
    /// stopped, circuit-broken, or reconnect-exhausted.
    Live {
        address: String,
        base_mint: String,
        quote_mint: String,
        #[clap(long)]
        authority_dbc: Option<String>,
        #[clap(long)]
        authority_cpmm: Option<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Family {
    BondingCurve,
    Amm,
    Cpmm,
}

impl From<Family> for ProtocolFamily {
    fn from(f: Family) -> Self {
        match f {
            Family::BondingCurve => ProtocolFamily::BondingCurve,
            Family::Amm => ProtocolFamily::Amm,
            Family::Cpmm => ProtocolFamily::Cpmm,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = IngestorConfig::from_env()?;

    match cli.command {
        Command::Poll { pool_address, base_mint, quote_mint, base_vault, quote_vault, family, successor_address } => {
            run_poll(&config, pool_address, base_mint, quote_mint, base_vault, quote_vault, family.into(), successor_address).await
        }
        Command::Live { address, base_mint, quote_mint, authority_dbc, authority_cpmm } => {
            run_live(&config, address, base_mint, quote_mint, authority_dbc, authority_cpmm).await
        }
    }
}

/// Runs `ingest_once` once against a single CLI-specified pool. A host
/// with a real store would instead pass every `status = "active"` pool
/// it loaded (§4.7); standalone, the in-memory [`InMemoryStore`] is the
/// store's stand-in (§1 names the persistent store an external
/// collaborator this engine never implements).
async fn run_poll(
    config: &IngestorConfig,
    pool_address: String,
    base_mint: String,
    quote_mint: String,
    base_vault: String,
    quote_vault: String,
    family: ProtocolFamily,
    successor_address: Option<String>,
) -> anyhow::Result<()> {
    let mut pool = GenericPoolConfig::new(
        Address::from(pool_address),
        base_mint,
        quote_mint,
        Address::from(base_vault),
        Address::from(quote_vault),
        family,
    );
    if let Some(successor) = successor_address {
        pool = pool.with_successor(Address::from(successor));
    }

    let tx_api = TransactionsApiClient::new(config.transactions_api_base.clone(), config.api_key.clone())
        .context("failed to build transactions API client")?;
    let store = InMemoryStore::default();
    let supervisor = IngestionSupervisor::new(config.max_workers);
    let cancel = CancellationToken::new();

    // The successor pool's own vault/mint config would normally come from
    // the store alongside `pool`'s; this CLI only takes its address, so
    // migration detection (§4.1 step 3) runs but the mirroring coordinator
    // (§4.5) has nothing to mirror into until a full successor config is
    // available.
    let active = [ActivePool { pool: &pool, successor: None }];
    let outcome = ingestor::ingest_once(&supervisor, &active, &store, &tx_api, &cancel).await;
    tracing::info!(?outcome, "poll round finished");
    Ok(())
}

/// Starts the live monitor for one address and blocks until it stops on
/// its own (Ctrl-C also cancels it).
async fn run_live(
    config: &IngestorConfig,
    address: String,
    base_mint: String,
    quote_mint: String,
    authority_dbc: Option<String>,
    authority_cpmm: Option<String>,
) -> anyhow::Result<()> {
    anyhow::ensure!(
        authority_dbc.is_some() || authority_cpmm.is_some(),
        "at least one of --authority-dbc/--authority-cpmm is required"
    );

    let monitor_config = LiveMonitorConfig {
        address: Address::from(address),
        base_mint,
        quote_mint,
        authority_dbc: authority_dbc.map(Address::from),
        authority_cpmm: authority_cpmm.map(Address::from),
    };

    let rpc = Arc::new(HttpRpcClient::new(config.rpc_http_url.clone()).context("failed to build RPC client")?);
    let store: Arc<dyn ingest_adapters::Store> = Arc::new(InMemoryStore::default());
    let connector = Arc::new(TungsteniteConnector);
    let role_addresses = Arc::new(HashSet::<Address>::new());

    let handle = ingestor::start_live_monitor(
        monitor_config,
        config.rpc_ws_url.clone(),
        connector,
        rpc,
        store,
        role_addresses,
        LiveMonitorTuning::default(),
    );

    let cancel_on_ctrl_c = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, stopping monitor");
            cancel_on_ctrl_c.cancel();
        }
    });

    let reason = handle.join().await.context("live monitor task panicked")?;
    tracing::info!(?reason, "live monitor stopped");

    Ok(())
}
