//! Pool Ingestion Worker (C6, §4.6).
//!
//! Per-pool state machine:
//!
//! ```text
//! Idle → FetchPage → Empty? → Done
//!                 ↘ NonEmpty → DedupExistence → PerTxLoop → SaveCursor → (next page | Done)
//! ```

pub mod error;

use std::time::Duration;

use async_trait::async_trait;
use ingest_adapters::{AdapterError, FetchPageParams, Store, TransactionsApiClient};
use ingest_metrics::IngestWorkerMetrics;
use ingest_types::{Address, EnhancedTransaction, PoolConfig};
use ingest_utils::sleep_cancellable;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

pub use error::WorkerError;

/// Page size and per-round page cap (§4.6, fixed constants the spec names
/// directly).
pub const PAGE_LIMIT: u32 = 100;
pub const MAX_PAGES_PER_ROUND: u32 = 2;

/// Seam between the worker's pagination/dedup/ordering policy and the
/// transactions-API wire client, so tests can supply a fake page source
/// without a real HTTP endpoint.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, address: &Address, params: &FetchPageParams) -> Result<Vec<EnhancedTransaction>, AdapterError>;
}

#[async_trait]
impl PageFetcher for TransactionsApiClient {
    async fn fetch_page(&self, address: &Address, params: &FetchPageParams) -> Result<Vec<EnhancedTransaction>, AdapterError> {
        TransactionsApiClient::fetch_page(self, address, params).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// The cursor's `enabled` flag was `false`; nothing was fetched.
    Disabled,
    /// Cancellation observed at a suspension point; state already flushed.
    Cancelled,
    /// Ran to completion: either an empty page or `MAX_PAGES_PER_ROUND` pages.
    Completed { pages_fetched: u32, transactions_processed: u64 },
}

/// Runs one ingestion round for a single pool (§4.6). `successor`, when
/// given, is consulted only if the Deriver reports a migration.
#[instrument(skip(pool, successor, store, fetcher, cancel), fields(pool_address = %pool.pool_address()))]
pub async fn ingest_pool_once(
    pool: &dyn PoolConfig,
    successor: Option<&dyn PoolConfig>,
    store: &dyn Store,
    fetcher: &dyn PageFetcher,
    cancel: &CancellationToken,
) -> Result<WorkerOutcome, WorkerError> {
    let metrics = IngestWorkerMetrics;

    let mut cursor = store.get_or_create_cursor(pool.pool_address()).await?;
    if !cursor.enabled {
        return Ok(WorkerOutcome::Disabled);
    }

    let mut before: Option<String> = None;
    let mut pages_fetched = 0u32;
    let mut transactions_processed = 0u64;
    let mut called_api = false;

    for _ in 0..MAX_PAGES_PER_ROUND {
        if cancel.is_cancelled() {
            store.upsert_cursor(cursor).await?;
            return Ok(WorkerOutcome::Cancelled);
        }

        let params = FetchPageParams { limit: PAGE_LIMIT, before: before.clone(), ..Default::default() };
        let mut page = match fetcher.fetch_page(pool.pool_address(), &params).await {
            Ok(page) => page,
            Err(err) => {
                warn!(%err, "page fetch failed, ending round");
                break;
            }
        };
        called_api = true;
        pages_fetched += 1;
        metrics.record_page_fetched(pool.pool_address().as_str());

        if page.is_empty() {
            break;
        }

        // §4.6: sort ascending by slot so holder bracket updates stay monotonic.
        page.sort_by_key(|tx| tx.slot);

        let signatures: Vec<String> = page.iter().map(|tx| tx.signature.clone()).collect();
        let already_seen = store.signatures_seen(&signatures).await?;

        for tx in &page {
            if cancel.is_cancelled() {
                store.upsert_cursor(cursor).await?;
                return Ok(WorkerOutcome::Cancelled);
            }
            if already_seen.contains(&tx.signature) {
                continue;
            }

            if let Err(err) = process_transaction(tx, pool, successor, store).await {
                warn!(signature = %tx.signature, %err, "transaction processing failed, continuing");
                continue;
            }

            cursor.observe(tx.slot, tx.timestamp, &tx.signature);
            transactions_processed += 1;
            metrics.record_transaction_processed(pool.pool_address().as_str());
        }

        store.upsert_cursor(cursor.clone()).await?;

        // §4.6: oldest signature of this page becomes the next page's `before`.
        before = page.first().map(|tx| tx.signature.clone());

        if !sleep_cancellable(Duration::from_secs(pool.family().page_interval_secs()), cancel).await {
            return Ok(WorkerOutcome::Cancelled);
        }
    }

    if called_api {
        cursor.last_execution = Some(chrono::Utc::now());
        store.upsert_cursor(cursor).await?;
    }

    Ok(WorkerOutcome::Completed { pages_fetched, transactions_processed })
}

/// C1→(C5 if applicable)→C2→C3 in that order (§4.6).
async fn process_transaction(
    tx: &EnhancedTransaction,
    pool: &dyn PoolConfig,
    successor: Option<&dyn PoolConfig>,
    store: &dyn Store,
) -> Result<(), WorkerError> {
    store.insert_transaction_if_new(pool.pool_address(), tx).await?;

    let outcome = ingest_derive::derive(tx, pool, successor);

    if outcome.migrated {
        if let Some(successor) = successor {
            IngestWorkerMetrics.record_migration_event(pool.pool_address().as_str(), successor.pool_address().as_str());
            ingest_migration::migrate(ingest_migration::MigrationDirection::BondingCurveToAmm, tx, pool, successor, store).await;
        }
    }

    let swaps = match ingest_swap::build_and_persist(tx, pool, &outcome.changes, store).await {
        Ok(swaps) => swaps,
        Err(ingest_swap::SwapError::AlreadyExists) => return Ok(()),
        Err(ingest_swap::SwapError::Store(err)) => return Err(err.into()),
    };

    let metrics = IngestWorkerMetrics;
    for swap in &swaps {
        metrics.record_swap_inserted(pool.pool_address().as_str());
        if let Err(err) = ingest_holders::apply(swap, pool, store).await {
            warn!(signature = %tx.signature, %err, "holder aggregation failed for swap");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use chrono::Utc;
    use ingest_adapters::test_support::InMemoryStore;
    use ingest_types::{GenericPoolConfig, ProtocolFamily, TokenTransfer};

    use super::*;

    struct FakeFetcher {
        pages: StdMutex<Vec<Vec<EnhancedTransaction>>>,
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_page(&self, _address: &Address, _params: &FetchPageParams) -> Result<Vec<EnhancedTransaction>, AdapterError> {
            Ok(self.pages.lock().unwrap().pop().unwrap_or_default())
        }
    }

    fn pool() -> GenericPoolConfig {
        GenericPoolConfig::new(
            Address::from("Pool"),
            "Base",
            "Quote",
            Address::from("BaseVault"),
            Address::from("QuoteVault"),
            ProtocolFamily::BondingCurve,
        )
    }

    fn tx(signature: &str, slot: u64, fee_payer: &str) -> EnhancedTransaction {
        EnhancedTransaction {
            signature: signature.to_string(),
            slot,
            timestamp: Utc::now(),
            fee: 5000,
            fee_payer: Address::from(fee_payer),
            r#type: "SWAP".into(),
            source: "TEST".into(),
            token_transfers: vec![TokenTransfer {
                mint: "Base".into(),
                from_user_account: Address::from("BaseVaultOwner"),
                to_user_account: Address::from(fee_payer),
                from_token_account: Address::from("BaseVault"),
                to_token_account: Address::from(format!("{fee_payer}BaseAta")),
                token_amount: rust_decimal::Decimal::ONE,
            }],
            account_data: vec![],
            raw: None,
        }
    }

    /// §8 P5: cursor reflects the min/max slot across the processed page.
    #[tokio::test]
    async fn cursor_tracks_min_and_max_slot_across_a_page() {
        let pool = pool();
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();

        // Pages popped from the back; push the (empty) second-round page first.
        let fetcher = FakeFetcher { pages: StdMutex::new(vec![vec![], vec![tx("sig-b", 30, "Bob"), tx("sig-a", 10, "Alice")]]) };

        let outcome = ingest_pool_once(&pool, None, &store, &fetcher, &cancel).await.unwrap();
        assert!(matches!(outcome, WorkerOutcome::Completed { .. }));

        let cursor = store.get_or_create_cursor(&Address::from("Pool")).await.unwrap();
        assert_eq!(cursor.start_slot, 10);
        assert_eq!(cursor.last_slot, 30);
        assert!(cursor.bracket_is_monotonic());
    }

    #[tokio::test]
    async fn disabled_cursor_skips_the_round_entirely() {
        let pool = pool();
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        let mut cursor = store.get_or_create_cursor(&Address::from("Pool")).await.unwrap();
        cursor.enabled = false;
        store.upsert_cursor(cursor).await.unwrap();

        let fetcher = FakeFetcher { pages: StdMutex::new(vec![vec![tx("sig-a", 1, "Alice")]]) };
        let outcome = ingest_pool_once(&pool, None, &store, &fetcher, &cancel).await.unwrap();
        assert_eq!(outcome, WorkerOutcome::Disabled);
    }

    #[tokio::test]
    async fn already_seen_signatures_are_skipped() {
        let pool = pool();
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        let the_tx = tx("sig-a", 1, "Alice");
        store.insert_transaction_if_new(&Address::from("Pool"), &the_tx).await.unwrap();

        let fetcher = FakeFetcher { pages: StdMutex::new(vec![vec![], vec![the_tx]]) };
        ingest_pool_once(&pool, None, &store, &fetcher, &cancel).await.unwrap();

        assert!(!store.swap_exists("sig-a", &Address::from("Alice")).await.unwrap());
    }
}
