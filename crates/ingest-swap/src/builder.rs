use std::collections::HashSet;

use ingest_adapters::{AdapterError, Store};
use ingest_types::{Address, AddressBalanceChange, EnhancedTransaction, PoolConfig, Swap, NATIVE_MINT};
use ingest_utils::decimals::{BASE_MINT_DECIMALS, NATIVE_DECIMALS, QUOTE_MINT_DECIMALS};
use rust_decimal::Decimal;
use tracing::warn;

use crate::error::SwapError;
use crate::wallet_stat::WalletStatUpdater;

/// C2: folds one transaction's balance changes into a primary swap row
/// (the fee payer's) plus zero or more secondary rows (§4.2), and drives
/// the Wallet-Stat Updater for every address whose swap insert succeeds.
pub async fn build_and_persist(
    tx: &EnhancedTransaction,
    pool: &dyn PoolConfig,
    changes: &[AddressBalanceChange],
    store: &dyn Store,
) -> Result<Vec<Swap>, SwapError> {
    let mut persisted = Vec::new();
    let updater = WalletStatUpdater::new(store);

    if tx.has_fee_payer() {
        if store.swap_exists(&tx.signature, &tx.fee_payer).await? {
            return Err(SwapError::AlreadyExists);
        }

        let swap = build_row(tx, pool, changes, &tx.fee_payer, true);
        store.insert_swap(swap.clone()).await?;
        apply_wallet_stats(&updater, &tx.fee_payer, &swap).await;
        persisted.push(swap);
    } else {
        warn!(signature = %tx.signature, "transaction has no fee payer, skipping primary swap");
    }

    let mut seen: HashSet<Address> = HashSet::new();
    for change in changes {
        if change.mint != pool.base_mint() {
            continue;
        }
        if change.address == tx.fee_payer || change.address == *pool.pool_address() {
            continue;
        }
        if change.address.is_empty() || !seen.insert(change.address.clone()) {
            continue;
        }

        match store.swap_exists(&tx.signature, &change.address).await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(error) => {
                warn!(signature = %tx.signature, address = %change.address, %error, "skipping secondary swap existence check");
                continue;
            }
        }

        let swap = build_row(tx, pool, changes, &change.address, false);
        match store.insert_swap(swap.clone()).await {
            Ok(()) => {
                apply_wallet_stats(&updater, &change.address, &swap).await;
                persisted.push(swap);
            }
            Err(AdapterError::AlreadyExists) => continue,
            Err(error) => {
                warn!(signature = %tx.signature, address = %change.address, %error, "skipping secondary swap insert");
            }
        }
    }

    Ok(persisted)
}

fn build_row(
    tx: &EnhancedTransaction,
    pool: &dyn PoolConfig,
    changes: &[AddressBalanceChange],
    address: &Address,
    is_primary: bool,
) -> Swap {
    let sum_for = |target: &Address, mint: &str| -> Decimal {
        changes.iter().filter(|c| c.address == *target && c.mint == mint).map(|c| c.amount_change).sum()
    };

    let (pool_base_change, pool_quote_change) = if is_primary {
        (sum_for(pool.pool_address(), pool.base_mint()), sum_for(pool.pool_address(), pool.quote_mint()))
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    Swap {
        slot: tx.slot,
        timestamp: tx.timestamp,
        pool_address: pool.pool_address().clone(),
        signature: tx.signature.clone(),
        fee: tx.fee,
        address: address.clone(),
        base_mint: pool.base_mint().to_string(),
        quote_mint: pool.quote_mint().to_string(),
        trader_base_change: sum_for(address, pool.base_mint()),
        trader_quote_change: sum_for(address, pool.quote_mint()),
        trader_sol_change: sum_for(address, NATIVE_MINT),
        pool_base_change,
        pool_quote_change,
    }
}

/// Drives C4 for one swap row: base/quote at their hard-coded decimal
/// counts, the native leg converted from lamports to whole-unit form
/// first (§4.2).
async fn apply_wallet_stats(updater: &WalletStatUpdater<'_>, owner: &Address, swap: &Swap) {
    let sol_readable = swap.trader_sol_change / Decimal::from(10u64.pow(NATIVE_DECIMALS));

    let legs = [
        (swap.base_mint.as_str(), swap.trader_base_change, BASE_MINT_DECIMALS),
        (swap.quote_mint.as_str(), swap.trader_quote_change, QUOTE_MINT_DECIMALS),
        (NATIVE_MINT, sol_readable, NATIVE_DECIMALS),
    ];

    for (mint, delta, decimals) in legs {
        if delta.is_zero() {
            continue;
        }
        if let Err(error) = updater.update(owner, mint, delta, decimals).await {
            warn!(owner = %owner, mint, %error, "wallet-stat update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ingest_adapters::test_support::InMemoryStore;
    use ingest_types::{GenericPoolConfig, ProtocolFamily};

    use super::*;

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

    fn base_tx(fee_payer: &str) -> EnhancedTransaction {
        EnhancedTransaction {
            signature: "sig1".into(),
            slot: 100,
            timestamp: Utc::now(),
            fee: 5000,
            fee_payer: Address::from(fee_payer),
            r#type: "SWAP".into(),
            source: "TEST".into(),
            token_transfers: vec![],
            account_data: vec![],
            raw: None,
        }
    }

    fn change(address: &str, mint: &str, amount: Decimal) -> AddressBalanceChange {
        AddressBalanceChange {
            slot: 100,
            timestamp: Utc::now(),
            signature: "sig1".into(),
            address: Address::from(address),
            mint: mint.to_string(),
            amount_change: amount,
        }
    }

    /// Scenario 1 (§8): primary swap persisted with both trader and pool legs.
    #[tokio::test]
    async fn primary_swap_aggregates_trader_and_pool_legs() {
        let pool = pool();
        let tx = base_tx("Alice");
        let changes = vec![
            change("Alice", "Base", Decimal::new(125, 2)),
            change("Pool", "Base", Decimal::new(-125, 2)),
            change("Alice", "Quote", Decimal::new(-5, 1)),
            change("Pool", "Quote", Decimal::new(5, 1)),
        ];

        let store = InMemoryStore::new();
        let persisted = build_and_persist(&tx, &pool, &changes, &store).await.unwrap();

        assert_eq!(persisted.len(), 1);
        let primary = &persisted[0];
        assert_eq!(primary.address, Address::from("Alice"));
        assert_eq!(primary.trader_base_change, Decimal::new(125, 2));
        assert_eq!(primary.pool_quote_change, Decimal::new(5, 1));
    }

    /// §8 P4: re-processing the same signature/fee-payer pair is rejected.
    #[tokio::test]
    async fn duplicate_primary_swap_is_rejected() {
        let pool = pool();
        let tx = base_tx("Alice");
        let changes = vec![change("Alice", "Base", Decimal::ONE)];

        let store = InMemoryStore::new();
        build_and_persist(&tx, &pool, &changes, &store).await.unwrap();

        let result = build_and_persist(&tx, &pool, &changes, &store).await;
        assert!(matches!(result, Err(SwapError::AlreadyExists)));
    }

    /// Scenario 3/4 (§8): secondary swaps get zeroed pool legs and are
    /// each attempted at most once, surviving a conflicting duplicate.
    #[tokio::test]
    async fn secondary_swaps_have_zero_pool_legs_and_dedupe() {
        let pool = pool();
        let tx = base_tx("Alice");
        let changes = vec![
            change("Alice", "Base", Decimal::new(10, 0)),
            change("Bob", "Base", Decimal::new(3, 0)),
            change("Bob", "Base", Decimal::new(1, 0)),
        ];

        let store = InMemoryStore::new();
        let persisted = build_and_persist(&tx, &pool, &changes, &store).await.unwrap();

        let bob = persisted.iter().find(|s| s.address == Address::from("Bob")).unwrap();
        assert_eq!(bob.pool_base_change, Decimal::ZERO);
        assert_eq!(bob.trader_base_change, Decimal::new(4, 0));
        assert_eq!(persisted.iter().filter(|s| s.address == Address::from("Bob")).count(), 1);
    }

    #[tokio::test]
    async fn missing_fee_payer_skips_primary_but_persists_secondaries() {
        let pool = pool();
        let tx = base_tx("");
        let changes = vec![change("Bob", "Base", Decimal::new(2, 0))];

        let store = InMemoryStore::new();
        let persisted = build_and_persist(&tx, &pool, &changes, &store).await.unwrap();

        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].address, Address::from("Bob"));
    }
}
