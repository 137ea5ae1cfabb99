//! In-memory [`Store`] used by this crate's own tests and re-exported
//! (behind the `test-utils` feature, mirroring the pack's `test-utils`
//! feature-flag convention) for every other crate's tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use ingest_types::{
    Address, EnhancedTransaction, Holder, LiveSwapTransaction, MonitorCursor, ProjectConfig, Swap,
    WalletTokenStat,
};
use parking_lot::Mutex;

use crate::{error::AdapterError, store::Store};

#[derive(Debug, Default)]
struct Inner {
    transactions: HashSet<String>,
    swaps: HashMap<(String, String), Swap>,
    holders: HashMap<(String, String, String), Holder>,
    wallet_stats: HashMap<(String, String), WalletTokenStat>,
    cursors: HashMap<String, MonitorCursor>,
    project_addresses: HashSet<String>,
    extra_project_addresses: HashSet<String>,
    role_addresses: HashSet<String>,
    project_configs: Vec<ProjectConfig>,
    migrated_pools: HashSet<String>,
    live_swaps: HashSet<String>,
}

/// A process-local, lock-guarded [`Store`]. Not for production use: it
/// exists purely so the rest of the workspace can be exercised without a
/// real database, per §1's framing of the store as an external
/// collaborator this engine only ever sees through the trait.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    inner: std::sync::Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_project_address(&self, address: &Address) {
        self.inner.lock().project_addresses.insert(address.as_str().to_string());
    }

    pub fn seed_extra_project_address(&self, address: &Address) {
        self.inner.lock().extra_project_addresses.insert(address.as_str().to_string());
    }

    pub fn seed_role_address(&self, address: &Address) {
        self.inner.lock().role_addresses.insert(address.as_str().to_string());
    }

    pub fn seed_project_config(&self, config: ProjectConfig) {
        self.inner.lock().project_configs.push(config);
    }

    pub fn is_migrated(&self, pool_address: &Address) -> bool {
        self.inner.lock().migrated_pools.contains(pool_address.as_str())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn signatures_seen(&self, signatures: &[String]) -> Result<HashSet<String>, AdapterError> {
        let inner = self.inner.lock();
        Ok(signatures.iter().filter(|s| inner.transactions.contains(*s)).cloned().collect())
    }

    async fn insert_transaction_if_new(
        &self,
        _pool_address: &Address,
        tx: &EnhancedTransaction,
    ) -> Result<bool, AdapterError> {
        Ok(self.inner.lock().transactions.insert(tx.signature.clone()))
    }

    async fn swap_exists(&self, signature: &str, address: &Address) -> Result<bool, AdapterError> {
        let key = (signature.to_string(), address.as_str().to_string());
        Ok(self.inner.lock().swaps.contains_key(&key))
    }

    async fn insert_swap(&self, swap: Swap) -> Result<(), AdapterError> {
        let key = (swap.signature.clone(), swap.address.as_str().to_string());
        let mut inner = self.inner.lock();
        if inner.swaps.contains_key(&key) {
            return Err(AdapterError::AlreadyExists);
        }
        inner.swaps.insert(key, swap);
        Ok(())
    }

    async fn get_holder(&self, address: &Address, base_mint: &str, quote_mint: &str) -> Result<Option<Holder>, AdapterError> {
        let key = (address.as_str().to_string(), base_mint.to_string(), quote_mint.to_string());
        Ok(self.inner.lock().holders.get(&key).cloned())
    }

    async fn upsert_holder(&self, holder: Holder) -> Result<(), AdapterError> {
        let key = (holder.address.as_str().to_string(), holder.base_mint.clone(), holder.quote_mint.clone());
        self.inner.lock().holders.insert(key, holder);
        Ok(())
    }

    async fn holders_for_pool(&self, pool_address: &Address) -> Result<Vec<Holder>, AdapterError> {
        Ok(self
            .inner
            .lock()
            .holders
            .values()
            .filter(|h| &h.pool_address == pool_address)
            .cloned()
            .collect())
    }

    async fn get_wallet_stat(&self, owner: &Address, mint: &str) -> Result<Option<WalletTokenStat>, AdapterError> {
        let key = (owner.as_str().to_string(), mint.to_string());
        Ok(self.inner.lock().wallet_stats.get(&key).cloned())
    }

    async fn upsert_wallet_stat(&self, stat: WalletTokenStat) -> Result<(), AdapterError> {
        let key = (stat.owner_address.as_str().to_string(), stat.mint.clone());
        self.inner.lock().wallet_stats.insert(key, stat);
        Ok(())
    }

    async fn get_or_create_cursor(&self, address: &Address) -> Result<MonitorCursor, AdapterError> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.cursors.get(address.as_str()) {
            return Ok(existing.clone());
        }
        let cursor = MonitorCursor::new(address.clone());
        inner.cursors.insert(address.as_str().to_string(), cursor.clone());
        Ok(cursor)
    }

    async fn upsert_cursor(&self, cursor: MonitorCursor) -> Result<(), AdapterError> {
        self.inner.lock().cursors.insert(cursor.address.as_str().to_string(), cursor);
        Ok(())
    }

    async fn is_project_address(&self, address: &Address) -> Result<bool, AdapterError> {
        Ok(self.inner.lock().project_addresses.contains(address.as_str()))
    }

    async fn is_extra_project_address(&self, address: &Address) -> Result<bool, AdapterError> {
        Ok(self.inner.lock().extra_project_addresses.contains(address.as_str()))
    }

    async fn role_addresses(&self) -> Result<HashSet<Address>, AdapterError> {
        Ok(self.inner.lock().role_addresses.iter().map(|s| Address::from(s.as_str())).collect())
    }

    async fn project_configs_for(&self, pool_platform: &str, pool_id: &str) -> Result<Vec<ProjectConfig>, AdapterError> {
        Ok(self
            .inner
            .lock()
            .project_configs
            .iter()
            .filter(|c| c.pool_platform == pool_platform && c.pool_id == pool_id)
            .cloned()
            .collect())
    }

    async fn update_project_config(
        &self,
        id: i64,
        pool_platform: &str,
        pool_id: &str,
    ) -> Result<(), AdapterError> {
        let mut inner = self.inner.lock();
        for config in inner.project_configs.iter_mut() {
            if config.id == id {
                config.pool_platform = pool_platform.to_string();
                config.pool_id = pool_id.to_string();
            }
        }
        Ok(())
    }

    async fn mark_pool_migrated(&self, pool_address: &Address) -> Result<(), AdapterError> {
        self.inner.lock().migrated_pools.insert(pool_address.as_str().to_string());
        Ok(())
    }

    async fn mark_pool_active(&self, pool_address: &Address) -> Result<(), AdapterError> {
        self.inner.lock().migrated_pools.remove(pool_address.as_str());
        Ok(())
    }

    async fn insert_live_swap(&self, swap: LiveSwapTransaction) -> Result<bool, AdapterError> {
        Ok(self.inner.lock().live_swaps.insert(swap.signature.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn swap_insert_is_idempotent_on_natural_key() {
        let store = InMemoryStore::new();
        let swap = sample_swap();

        store.insert_swap(swap.clone()).await.unwrap();
        let err = store.insert_swap(swap).await.unwrap_err();
        assert!(matches!(err, AdapterError::AlreadyExists));
    }

    #[tokio::test]
    async fn cursor_creation_is_idempotent() {
        let store = InMemoryStore::new();
        let addr = Address::from("Watched1");

        let first = store.get_or_create_cursor(&addr).await.unwrap();
        let second = store.get_or_create_cursor(&addr).await.unwrap();
        assert_eq!(first.address, second.address);
    }

    fn sample_swap() -> Swap {
        Swap {
            slot: 1,
            timestamp: chrono::Utc::now(),
            pool_address: Address::from("Pool"),
            signature: "sig".into(),
            fee: 0,
            address: Address::from("Alice"),
            base_mint: "Base".into(),
            quote_mint: "Quote".into(),
            trader_base_change: Default::default(),
            trader_quote_change: Default::default(),
            trader_sol_change: Default::default(),
            pool_base_change: Default::default(),
            pool_quote_change: Default::default(),
        }
    }
}
