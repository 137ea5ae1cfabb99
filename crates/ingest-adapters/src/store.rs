use std::collections::HashSet;

use async_trait::async_trait;
use ingest_types::{
    Address, EnhancedTransaction, Holder, LiveSwapTransaction, MonitorCursor, ProjectConfig, Swap,
    WalletTokenStat,
};

use crate::error::AdapterError;

/// Typed repository interface the engine writes through (§6). No SQL, no
/// driver: every method name is the semantic operation the spec names
/// against a named table. A real implementation lives on the host side of
/// the boundary in §1; this crate ships only this trait plus an in-memory
/// reference implementation for the test suite.
#[async_trait]
pub trait Store: Send + Sync {
    /// Bulk existence check against `AddressTransaction`, by signature.
    async fn signatures_seen(&self, signatures: &[String]) -> Result<HashSet<String>, AdapterError>;

    /// Insert-if-new into `AddressTransaction`. Returns `true` if this call
    /// inserted the row, `false` if it already existed.
    async fn insert_transaction_if_new(
        &self,
        pool_address: &Address,
        tx: &EnhancedTransaction,
    ) -> Result<bool, AdapterError>;

    async fn swap_exists(&self, signature: &str, address: &Address) -> Result<bool, AdapterError>;

    /// Inserts a swap row. Returns [`AdapterError::AlreadyExists`] on a
    /// `(signature, address)` conflict (§4.2, §8 P4).
    async fn insert_swap(&self, swap: Swap) -> Result<(), AdapterError>;

    /// Looks up a holder row by its natural key (§3). Both row shapes key
    /// off `(address, base_mint, quote_mint)`, not `pool_address`: for the
    /// pool row, `address` already equals `pool_address`, so the pair is
    /// redundant there; for a trader row, `pool_address` is informational
    /// data carried on [`Holder`], not part of the key, so the same trader
    /// address merges into one row across every pool sharing a mint pair.
    async fn get_holder(&self, address: &Address, base_mint: &str, quote_mint: &str) -> Result<Option<Holder>, AdapterError>;

    async fn upsert_holder(&self, holder: Holder) -> Result<(), AdapterError>;

    /// All non-pool holders of `pool_address`, for migration mirroring
    /// (§4.5 step 1).
    async fn holders_for_pool(&self, pool_address: &Address) -> Result<Vec<Holder>, AdapterError>;

    async fn get_wallet_stat(&self, owner: &Address, mint: &str) -> Result<Option<WalletTokenStat>, AdapterError>;

    async fn upsert_wallet_stat(&self, stat: WalletTokenStat) -> Result<(), AdapterError>;

    /// Loads the cursor for `address`, creating it if absent. The creation
    /// path is racey-duplicate-safe: a second concurrent caller observes
    /// the first caller's row rather than inserting a second one (§6).
    async fn get_or_create_cursor(&self, address: &Address) -> Result<MonitorCursor, AdapterError>;

    async fn upsert_cursor(&self, cursor: MonitorCursor) -> Result<(), AdapterError>;

    /// `AddressManage` existence check (primary project-address table,
    /// §4.3 classification step 1).
    async fn is_project_address(&self, address: &Address) -> Result<bool, AdapterError>;

    /// `ProjectExtraAddress` existence check (secondary table, consulted
    /// after `AddressManage`, §4.3).
    async fn is_extra_project_address(&self, address: &Address) -> Result<bool, AdapterError>;

    /// `RoleAddress` select-all, for the live monitor's membership set.
    async fn role_addresses(&self) -> Result<HashSet<Address>, AdapterError>;

    async fn project_configs_for(&self, pool_platform: &str, pool_id: &str) -> Result<Vec<ProjectConfig>, AdapterError>;

    async fn update_project_config(
        &self,
        id: i64,
        pool_platform: &str,
        pool_id: &str,
    ) -> Result<(), AdapterError>;

    async fn mark_pool_migrated(&self, pool_address: &Address) -> Result<(), AdapterError>;

    async fn mark_pool_active(&self, pool_address: &Address) -> Result<(), AdapterError>;

    /// Insert-if-new into `SwapTransaction` (live path, §4.8 step 7).
    /// Returns `true` if this call inserted the row.
    async fn insert_live_swap(&self, swap: LiveSwapTransaction) -> Result<bool, AdapterError>;
}
