use chrono::Utc;
use ingest_adapters::Store;
use ingest_types::{Address, WalletTokenStat};
use rust_decimal::Decimal;

use crate::error::SwapError;

/// C4: maintains a running human-readable + raw balance per `(owner,
/// mint)` consistent with swap deltas (§4.4).
pub struct WalletStatUpdater<'a> {
    store: &'a dyn Store,
}

impl<'a> WalletStatUpdater<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Applies one `(owner, mint)` delta.
    ///
    /// Decreases that would drive `balance_readable` below zero are
    /// silently discarded (documented oddity, §4.4/§9): the row's balances
    /// are left untouched but `updated_at` still advances. This is
    /// preserved exactly as specified, not "fixed" here.
    pub async fn update(
        &self,
        owner: &Address,
        mint: &str,
        delta_readable: Decimal,
        decimals: u32,
    ) -> Result<(), SwapError> {
        let now = Utc::now();

        match self.store.get_wallet_stat(owner, mint).await? {
            None => {
                let balance_readable = delta_readable.max(Decimal::ZERO);
                let balance_raw = to_raw(balance_readable, decimals);
                self.store
                    .upsert_wallet_stat(WalletTokenStat {
                        owner_address: owner.clone(),
                        mint: mint.to_string(),
                        decimals,
                        balance_raw,
                        balance_readable,
                        slot: 0,
                        block_time: now,
                        updated_at: now,
                    })
                    .await?;
            }
            Some(mut existing) => {
                let new_readable = existing.balance_readable + delta_readable;
                if new_readable >= Decimal::ZERO {
                    existing.balance_readable = new_readable;
                    existing.balance_raw = to_raw(new_readable, decimals);
                }
                existing.updated_at = now;
                self.store.upsert_wallet_stat(existing).await?;
            }
        }

        Ok(())
    }
}

fn to_raw(readable: Decimal, decimals: u32) -> i128 {
    let scaled = readable * Decimal::from(10u64.pow(decimals));
    scaled.round().mantissa()
}

#[cfg(test)]
mod tests {
    use ingest_adapters::test_support::InMemoryStore;

    use super::*;

    /// §8 P8: balance_readable never goes negative.
    #[tokio::test]
    async fn decrease_below_zero_is_clamped_and_discarded() {
        let store = InMemoryStore::new();
        let owner = Address::from("Alice");
        let updater = WalletStatUpdater::new(&store);

        updater.update(&owner, "Base", Decimal::new(10, 0), 6).await.unwrap();
        updater.update(&owner, "Base", Decimal::new(-100, 0), 6).await.unwrap();

        let stat = store.get_wallet_stat(&owner, "Base").await.unwrap().unwrap();
        assert_eq!(stat.balance_readable, Decimal::new(10, 0));
    }

    #[tokio::test]
    async fn positive_delta_accumulates() {
        let store = InMemoryStore::new();
        let owner = Address::from("Alice");
        let updater = WalletStatUpdater::new(&store);

        updater.update(&owner, "Base", Decimal::new(10, 0), 6).await.unwrap();
        updater.update(&owner, "Base", Decimal::new(5, 0), 6).await.unwrap();

        let stat = store.get_wallet_stat(&owner, "Base").await.unwrap().unwrap();
        assert_eq!(stat.balance_readable, Decimal::new(15, 0));
        assert_eq!(stat.balance_raw, 15_000_000);
    }

    #[tokio::test]
    async fn first_observation_with_negative_delta_clamps_to_zero() {
        let store = InMemoryStore::new();
        let owner = Address::from("Alice");
        let updater = WalletStatUpdater::new(&store);

        updater.update(&owner, "Base", Decimal::new(-5, 0), 6).await.unwrap();

        let stat = store.get_wallet_stat(&owner, "Base").await.unwrap().unwrap();
        assert_eq!(stat.balance_readable, Decimal::ZERO);
    }
}
