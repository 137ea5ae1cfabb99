//! Process wiring (§6 "Process interface"): the two entry points the spec
//! names, `ingest_once` and `start_live_monitor`. The control-flow and
//! state machines they invoke live in `ingest-supervisor`/`ingest-live`;
//! this crate only composes them with a concrete store/transport and
//! exposes a handle a host process can hold onto.

pub mod config;

use std::{collections::HashSet, sync::Arc};

use ingest_adapters::{RpcAdapter, Store};
use ingest_live::{LiveMonitorConfig, LiveMonitorTuning, MonitorStopReason, WsConnector};
use ingest_supervisor::{ActivePool, IngestionSupervisor, RoundOutcome};
use ingest_types::Address;
use ingest_worker::PageFetcher;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs one polling round across `active_pools` (§6: `ingest_once(ctx,
/// store, tx_api, rpc)`; the RPC adapter is threaded through to the
/// migration/derive paths via the pool workers themselves, not this
/// function directly).
pub async fn ingest_once(
    supervisor: &IngestionSupervisor,
    active_pools: &[ActivePool<'_>],
    store: &dyn Store,
    tx_api: &dyn PageFetcher,
    cancel: &CancellationToken,
) -> RoundOutcome {
    supervisor.run_round(active_pools, store, tx_api, cancel).await
}

/// A running live monitor task (§6: `start_live_monitor(...) ->
/// Result<LiveMonitorHandle>`). Dropping this without calling [`stop`]
/// leaves the task running detached; callers that need deterministic
/// shutdown must call `stop` and then `await` the join handle.
pub struct LiveMonitorHandle {
    cancel: CancellationToken,
    join: JoinHandle<MonitorStopReason>,
}

impl LiveMonitorHandle {
    /// Signals the monitor to stop at its next suspension point.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// A clone of the cancellation token backing [`stop`](Self::stop), for
    /// callers that want to wire an external stop signal (e.g. Ctrl-C)
    /// into a task that outlives a `&self` borrow of this handle.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn join(self) -> Result<MonitorStopReason, tokio::task::JoinError> {
        self.join.await
    }
}

/// Spawns a detached task running the live monitor for one address until
/// stopped, circuit-broken, or reconnect-exhausted (§4.8).
pub fn start_live_monitor(
    config: LiveMonitorConfig,
    ws_url: url::Url,
    connector: Arc<dyn WsConnector>,
    rpc: Arc<dyn RpcAdapter>,
    store: Arc<dyn Store>,
    role_addresses: Arc<HashSet<Address>>,
    tuning: LiveMonitorTuning,
) -> LiveMonitorHandle {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();

    let join = tokio::spawn(async move {
        ingest_live::run_monitor(
            &config,
            &ws_url,
            connector.as_ref(),
            rpc.as_ref(),
            store.as_ref(),
            role_addresses.as_ref(),
            tuning,
            &task_cancel,
        )
        .await
    });

    LiveMonitorHandle { cancel, join }
}
