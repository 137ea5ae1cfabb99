//! Ingestion Supervisor (C7, §4.7).
//!
//! Bounds and serializes pool-worker execution: a round mutex keeps a
//! second round from starting while one is in flight (try-lock, skip on
//! failure), a semaphore caps concurrent pool workers at `max_workers`,
//! and a per-address lock registry prevents two workers from racing on
//! the same pool within or across rounds (§8 P12).

use std::sync::Arc;

use std::time::Instant;

use ingest_adapters::Store;
use ingest_metrics::IngestWorkerMetrics;
use ingest_types::{PoolConfig, PoolStatus};
use ingest_utils::AddressLockRegistry;
use ingest_worker::{ingest_pool_once, PageFetcher, WorkerError, WorkerOutcome};
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default bound on concurrent pool workers (§4.7).
pub const MAX_WORKERS: usize = 3;

/// One pool slated for this round, paired with its migration successor
/// if it has one (§4.6's `successor` argument to the Deriver/Coordinator).
pub struct ActivePool<'a> {
    pub pool: &'a dyn PoolConfig,
    pub successor: Option<&'a dyn PoolConfig>,
}

#[derive(Debug)]
pub enum PoolRunOutcome {
    Ran(WorkerOutcome),
    /// Another worker already held this pool's address lock (§8 P12).
    SkippedLocked,
    Failed(WorkerError),
}

#[derive(Debug)]
pub enum RoundOutcome {
    /// A round was already in flight; this invocation did nothing (§4.7).
    Skipped,
    Completed(Vec<PoolRunOutcome>),
}

pub struct IngestionSupervisor {
    round_mutex: Mutex<()>,
    semaphore: Arc<Semaphore>,
    address_locks: AddressLockRegistry,
}

impl IngestionSupervisor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            round_mutex: Mutex::new(()),
            semaphore: Arc::new(Semaphore::new(max_workers)),
            address_locks: AddressLockRegistry::new(),
        }
    }

    /// Runs one round across `active_pools`, bounded by `max_workers`
    /// concurrent workers. Returns [`RoundOutcome::Skipped`] immediately
    /// if another round is already in flight (try-lock, never blocks).
    pub async fn run_round(
        &self,
        active_pools: &[ActivePool<'_>],
        store: &dyn Store,
        fetcher: &dyn PageFetcher,
        cancel: &CancellationToken,
    ) -> RoundOutcome {
        let _round_guard = match self.round_mutex.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("ingestion round already in flight, skipping");
                IngestWorkerMetrics.record_round_skipped();
                return RoundOutcome::Skipped;
            }
        };

        let started = Instant::now();
        let outcomes = futures::future::join_all(
            active_pools.iter().map(|active| self.run_one(active, store, fetcher, cancel)),
        )
        .await;
        IngestWorkerMetrics.record_round_duration(started.elapsed());

        RoundOutcome::Completed(outcomes)
    }

    async fn run_one(
        &self,
        active: &ActivePool<'_>,
        store: &dyn Store,
        fetcher: &dyn PageFetcher,
        cancel: &CancellationToken,
    ) -> PoolRunOutcome {
        let address = active.pool.pool_address().as_str().to_string();
        let Some(_lock) = self.address_locks.try_acquire(&address) else {
            debug!(pool_address = %address, "pool already being processed, skipping");
            return PoolRunOutcome::SkippedLocked;
        };

        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(pool_address = %address, "worker semaphore closed unexpectedly");
                return PoolRunOutcome::SkippedLocked;
            }
        };

        match ingest_pool_once(active.pool, active.successor, store, fetcher, cancel).await {
            Ok(outcome) => PoolRunOutcome::Ran(outcome),
            Err(err) => PoolRunOutcome::Failed(err),
        }
    }
}

/// Selects the pools with `status = Active` (§4.7: "a simple query over
/// configs with status = active", preserved as a plain filter here since
/// the concrete predicate is a host/store concern per family).
pub fn select_active<P: PoolConfig>(pools: &[P]) -> Vec<&P> {
    pools.iter().filter(|p| p.status() == PoolStatus::Active).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use ingest_adapters::{test_support::InMemoryStore, AdapterError, FetchPageParams};
    use ingest_types::{Address, EnhancedTransaction, GenericPoolConfig, ProtocolFamily};

    use super::*;

    struct SlowFetcher {
        delay: Duration,
    }

    #[async_trait]
    impl PageFetcher for SlowFetcher {
        async fn fetch_page(&self, _address: &Address, _params: &FetchPageParams) -> Result<Vec<EnhancedTransaction>, AdapterError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![])
        }
    }

    struct FastFetcher;

    #[async_trait]
    impl PageFetcher for FastFetcher {
        async fn fetch_page(&self, _address: &Address, _params: &FetchPageParams) -> Result<Vec<EnhancedTransaction>, AdapterError> {
            Ok(vec![])
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

    /// §8 P12: at most one round is in flight process-wide.
    #[tokio::test]
    async fn a_second_round_is_skipped_while_the_first_is_in_flight() {
        let supervisor = IngestionSupervisor::new(MAX_WORKERS);
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        let pool = pool();
        let active = [ActivePool { pool: &pool, successor: None }];

        let slow = SlowFetcher { delay: Duration::from_millis(200) };
        let fast = FastFetcher;

        let (first, second) = tokio::join!(
            supervisor.run_round(&active, &store, &slow, &cancel),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                supervisor.run_round(&active, &store, &fast, &cancel).await
            }
        );

        assert!(matches!(first, RoundOutcome::Completed(_)));
        assert!(matches!(second, RoundOutcome::Skipped));
    }

    /// §8 P12: two concurrent attempts on the same pool address — one wins.
    #[tokio::test]
    async fn same_pool_address_is_not_processed_twice_concurrently() {
        let supervisor = IngestionSupervisor::new(MAX_WORKERS);
        let pool = pool();
        let guard = supervisor.address_locks.try_acquire(pool.pool_address().as_str());
        assert!(guard.is_some());

        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        let active = ActivePool { pool: &pool, successor: None };
        let outcome = supervisor.run_one(&active, &store, &FastFetcher, &cancel).await;

        assert!(matches!(outcome, PoolRunOutcome::SkippedLocked));
    }
}
