//! Live WebSocket Monitor (C8, §4.8).
//!
//! Per-address connection state machine:
//!
//! ```text
//! Disconnected --dial--> Connecting --subscribe_ok--> Connected --read_loop--> (on read_error|stop)
//!      ↑                          ↘fail(inc error_count)                          ↓
//!      └──────────── backoff ──────────────┴──────── Reconnect ⇠──────────────────┘
//! ```
//!
//! One task per address runs [`run_monitor`] to completion; there is no
//! separate reader task here (`tokio::select!` plays that role within a
//! single future, same effect without a second spawn).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest_adapters::{ws::LogsNotification, AdapterError, RpcAdapter, Store};
use ingest_metrics::LiveMonitorMetrics;
use ingest_types::{Address, LiveSwapTransaction, PayerType, SwapAction};
use ingest_utils::{is_not_found, retry_with_backoff, sleep_cancellable, BackoffConfig};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// The remove-liquidity threshold (§4.8 step 5, §9): a naked numeric
/// literal in whole quote units, preserved as-is.
const REMOVE_LIQUIDITY_THRESHOLD: Decimal = Decimal::from_parts(70, 0, 0, false, 0);

/// `error_count ≥ this` stops the monitor and tears down resources (§4.8).
const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 6;
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Subscription parameters for one monitored address (§4.8). At least one
/// of `authority_dbc`/`authority_cpmm` must be set; both may be, since the
/// Balance-Change Deriver sums across whichever are non-empty.
#[derive(Debug, Clone)]
pub struct LiveMonitorConfig {
    pub address: Address,
    pub base_mint: String,
    pub quote_mint: String,
    pub authority_dbc: Option<Address>,
    pub authority_cpmm: Option<Address>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Why [`run_monitor`] returned. Never an `Err` — every stop condition is
/// an ordinary outcome of the state machine, not a failure of the monitor
/// itself (§7: cancellation is "ordinary flow"; the same applies to the
/// breaker trip and reconnect exhaustion, both policies, not bugs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStopReason {
    Cancelled,
    CircuitBreakerTripped,
    MaxReconnectsExceeded,
    RemoveLiquidityDetected,
}

/// Knobs the spec hard-codes (§4.8), broken out so tests can run the
/// state machine at real speed instead of waiting on 5 s reconnect delays.
#[derive(Debug, Clone, Copy)]
pub struct LiveMonitorTuning {
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
    pub circuit_breaker_threshold: u32,
}

impl Default for LiveMonitorTuning {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            circuit_breaker_threshold: DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
        }
    }
}

/// One live `logsSubscribe` connection, seamed out so tests can supply a
/// canned notification sequence instead of a real socket.
#[async_trait]
pub trait LogsConnection: Send {
    async fn subscribe(&mut self, address: &Address) -> Result<u64, AdapterError>;
    async fn next_notification(&mut self) -> Result<LogsNotification, AdapterError>;
    async fn close(self: Box<Self>) -> Result<(), AdapterError>;
}

#[async_trait]
impl LogsConnection for ingest_adapters::ws::LogsWsConnection {
    async fn subscribe(&mut self, address: &Address) -> Result<u64, AdapterError> {
        ingest_adapters::ws::LogsWsConnection::subscribe(self, address).await
    }

    async fn next_notification(&mut self) -> Result<LogsNotification, AdapterError> {
        ingest_adapters::ws::LogsWsConnection::next_notification(self).await
    }

    async fn close(self: Box<Self>) -> Result<(), AdapterError> {
        ingest_adapters::ws::LogsWsConnection::close(*self).await
    }
}

/// Dials a fresh connection. Split from [`LogsConnection`] because dialing
/// has no `self` yet to call through.
#[async_trait]
pub trait WsConnector: Send + Sync {
    async fn connect(&self, url: &url::Url) -> Result<Box<dyn LogsConnection>, AdapterError>;
}

/// `tokio-tungstenite`-backed connector (C9 wire layer).
pub struct TungsteniteConnector;

#[async_trait]
impl WsConnector for TungsteniteConnector {
    async fn connect(&self, url: &url::Url) -> Result<Box<dyn LogsConnection>, AdapterError> {
        let connection = ingest_adapters::ws::LogsWsConnection::connect(url).await?;
        Ok(Box::new(connection))
    }
}

/// Runs the per-address connection state machine until stopped,
/// circuit-broken, reconnect-exhausted, or a successful remove-liquidity
/// is observed (§4.8). Blocks the calling task for its whole lifetime;
/// callers spawn one of these per monitored address.
#[instrument(skip(config, connector, rpc, store, role_addresses, cancel), fields(address = %config.address))]
pub async fn run_monitor(
    config: &LiveMonitorConfig,
    ws_url: &url::Url,
    connector: &dyn WsConnector,
    rpc: &dyn RpcAdapter,
    store: &dyn Store,
    role_addresses: &HashSet<Address>,
    tuning: LiveMonitorTuning,
    cancel: &CancellationToken,
) -> MonitorStopReason {
    let metrics = LiveMonitorMetrics;
    let mut error_count = 0u32;
    let mut reconnect_attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return MonitorStopReason::Cancelled;
        }

        debug!(status = ?ConnectionStatus::Connecting, "dialing live monitor connection");
        // Only a successful *message read* resets `error_count` (§4.8): a
        // dial that merely succeeds after a read/process error run is still
        // part of that run's reconnect, not a recovery, so it must not wipe
        // out errors already counted toward the breaker (§8 P9).
        let mut connection = match connector.connect(ws_url).await {
            Ok(connection) => connection,
            Err(err) => {
                warn!(%err, "dial failed");
                error_count += 1;
                if error_count >= tuning.circuit_breaker_threshold {
                    metrics.record_circuit_breaker_trip(config.address.as_str());
                    return MonitorStopReason::CircuitBreakerTripped;
                }
                reconnect_attempts += 1;
                if reconnect_attempts > tuning.max_reconnect_attempts {
                    return MonitorStopReason::MaxReconnectsExceeded;
                }
                metrics.record_reconnect(config.address.as_str());
                if !sleep_cancellable(tuning.reconnect_delay, cancel).await {
                    return MonitorStopReason::Cancelled;
                }
                continue;
            }
        };

        if let Err(err) = connection.subscribe(&config.address).await {
            warn!(%err, "subscribe failed");
            error_count += 1;
            if error_count >= tuning.circuit_breaker_threshold {
                metrics.record_circuit_breaker_trip(config.address.as_str());
                return MonitorStopReason::CircuitBreakerTripped;
            }
            reconnect_attempts += 1;
            if reconnect_attempts > tuning.max_reconnect_attempts {
                return MonitorStopReason::MaxReconnectsExceeded;
            }
            metrics.record_reconnect(config.address.as_str());
            if !sleep_cancellable(tuning.reconnect_delay, cancel).await {
                return MonitorStopReason::Cancelled;
            }
            continue;
        }
        info!(status = ?ConnectionStatus::Connected, "live monitor connected");
        reconnect_attempts = 0;

        loop {
            let notification = tokio::select! {
                result = connection.next_notification() => result,
                _ = cancel.cancelled() => return MonitorStopReason::Cancelled,
            };

            let notification = match notification {
                Ok(notification) => {
                    error_count = 0;
                    notification
                }
                Err(err) => {
                    warn!(%err, "read error");
                    error_count += 1;
                    break;
                }
            };

            match process_notification(config, &notification, rpc, store, role_addresses, cancel).await {
                ProcessOutcome::Persisted | ProcessOutcome::Dropped => {}
                ProcessOutcome::QualifyingError => {
                    error_count += 1;
                    if error_count >= tuning.circuit_breaker_threshold {
                        metrics.record_circuit_breaker_trip(config.address.as_str());
                        return MonitorStopReason::CircuitBreakerTripped;
                    }
                }
                ProcessOutcome::StopRemoveLiquidity => {
                    return MonitorStopReason::RemoveLiquidityDetected;
                }
            }

            if error_count >= tuning.circuit_breaker_threshold {
                metrics.record_circuit_breaker_trip(config.address.as_str());
                return MonitorStopReason::CircuitBreakerTripped;
            }
        }

        if error_count >= tuning.circuit_breaker_threshold {
            metrics.record_circuit_breaker_trip(config.address.as_str());
            return MonitorStopReason::CircuitBreakerTripped;
        }
        reconnect_attempts += 1;
        if reconnect_attempts > tuning.max_reconnect_attempts {
            return MonitorStopReason::MaxReconnectsExceeded;
        }
        metrics.record_reconnect(config.address.as_str());
        if !sleep_cancellable(tuning.reconnect_delay, cancel).await {
            return MonitorStopReason::Cancelled;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessOutcome {
    Persisted,
    Dropped,
    StopRemoveLiquidity,
    QualifyingError,
}

/// `processTransactionWithError` (§4.8): fetch-with-retry, derive balance
/// changes, classify, filter, persist.
async fn process_notification(
    config: &LiveMonitorConfig,
    notification: &LogsNotification,
    rpc: &dyn RpcAdapter,
    store: &dyn Store,
    role_addresses: &HashSet<Address>,
    cancel: &CancellationToken,
) -> ProcessOutcome {
    let fetch_result = retry_with_backoff(
        || rpc.get_parsed_transaction(&notification.signature),
        |err: &AdapterError| is_not_found(&err.message()),
        BackoffConfig::default(),
        cancel,
    )
    .await;

    let parsed = match fetch_result {
        Ok(parsed) => parsed,
        Err(err) if is_not_found(&err.message()) => {
            debug!(signature = %notification.signature, "transaction not found after retries, dropping");
            LiveMonitorMetrics.record_not_found_dropped(config.address.as_str());
            return ProcessOutcome::Dropped;
        }
        Err(err) => {
            warn!(signature = %notification.signature, %err, "transaction fetch failed");
            return ProcessOutcome::QualifyingError;
        }
    };

    let (base_change, quote_change, action) = match &parsed.meta {
        Some(meta) => {
            let base_change = leg_change(&config.authority_dbc, &config.authority_cpmm, meta, &config.base_mint);
            let quote_change = leg_change(&config.authority_dbc, &config.authority_cpmm, meta, &config.quote_mint);
            let action = classify_action(base_change, quote_change);
            (base_change, quote_change, action)
        }
        // §4.8 step 3: meta missing still emits a row, zero fields, unknown action.
        None => (Decimal::ZERO, Decimal::ZERO, SwapAction::Unknown),
    };

    let is_success = parsed.meta.as_ref().map(|m| m.err.is_none()).unwrap_or(false);

    if role_addresses.contains(&parsed.fee_payer) {
        debug!(payer = %parsed.fee_payer, "role address, skipping persistence");
        return if action == SwapAction::RemoveLiquidity && is_success {
            ProcessOutcome::StopRemoveLiquidity
        } else {
            ProcessOutcome::Dropped
        };
    }

    let timestamp_seconds = parsed.block_time_millis.map(|ms| ms / 1000).unwrap_or(0).max(0);
    let timestamp = DateTime::<Utc>::from_timestamp(timestamp_seconds, 0).unwrap_or_else(Utc::now);

    let row = LiveSwapTransaction {
        signature: parsed.signature.clone(),
        pool_address: config.address.clone(),
        payer: parsed.fee_payer.clone(),
        base_mint: config.base_mint.clone(),
        quote_mint: config.quote_mint.clone(),
        base_change,
        quote_change,
        action,
        payer_type: PayerType::from(action),
        is_success,
        timestamp,
    };

    if let Err(err) = store.insert_live_swap(row).await {
        warn!(signature = %parsed.signature, %err, "failed to persist live swap");
        return ProcessOutcome::QualifyingError;
    }

    LiveMonitorMetrics.record_notification_processed(config.address.as_str());

    if action == SwapAction::RemoveLiquidity && is_success {
        return ProcessOutcome::StopRemoveLiquidity;
    }

    ProcessOutcome::Persisted
}

/// Sums the balance delta for `mint` across whichever of `authority_dbc`/
/// `authority_cpmm` is present (§4.8 step 4): for each authority, match
/// `(mint, owner)` between pre/post; a post entry with no matching pre is
/// treated as pre = 0; an authority with no post entry contributes 0.
fn leg_change(
    authority_dbc: &Option<Address>,
    authority_cpmm: &Option<Address>,
    meta: &ingest_adapters::rpc::TransactionMeta,
    mint: &str,
) -> Decimal {
    [authority_dbc, authority_cpmm]
        .into_iter()
        .flatten()
        .map(|authority| authority_leg_change(authority, meta, mint))
        .sum()
}

fn authority_leg_change(authority: &Address, meta: &ingest_adapters::rpc::TransactionMeta, mint: &str) -> Decimal {
    let post = meta
        .post_token_balances
        .iter()
        .find(|entry| entry.mint == mint && &entry.owner == authority);

    let Some(post) = post else { return Decimal::ZERO };

    let pre = meta
        .pre_token_balances
        .iter()
        .find(|entry| entry.mint == mint && &entry.owner == authority)
        .map(|entry| entry.ui_amount)
        .unwrap_or(Decimal::ZERO);

    post.ui_amount - pre
}

/// §4.8 step 5, §9: the `-70` threshold is a preserved literal, not a
/// configuration value.
fn classify_action(base_change: Decimal, quote_change: Decimal) -> SwapAction {
    if quote_change <= -REMOVE_LIQUIDITY_THRESHOLD {
        SwapAction::RemoveLiquidity
    } else if base_change > Decimal::ZERO && quote_change < Decimal::ZERO {
        SwapAction::Sell
    } else if base_change < Decimal::ZERO && quote_change > Decimal::ZERO {
        SwapAction::Buy
    } else if base_change > Decimal::ZERO && quote_change > Decimal::ZERO {
        SwapAction::AddLiquidity
    } else {
        SwapAction::Unknown
    }
}
