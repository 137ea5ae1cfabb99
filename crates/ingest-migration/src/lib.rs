//! Migration Coordinator (C5, §4.5).
//!
//! Invoked from the Pool Ingestion Worker whenever the Deriver reports
//! `migrated = true` for a pool with a `successor_pool_address`. Every
//! step is independently best-effort: a failure is logged and the
//! remaining steps still run, since every write is idempotent on its
//! natural key and re-entry after a crash replays the same transaction
//! safely (§4.5, §8 P11).

pub mod error;

use ingest_adapters::Store;
use ingest_types::{EnhancedTransaction, PoolConfig, ProtocolFamily};
use tracing::{error, instrument};

pub use error::MigrationError;

/// Distinguishes the two coordinator invocations the source carries: the
/// bonding-curve→AMM migration this module was modeled on, and a second,
/// structurally identical forward coordinator (§9). Both run the exact
/// same five-step procedure; the direction only selects which family
/// label is used for logging and project-config rewiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    BondingCurveToAmm,
    Forward,
}

/// Runs the five-step migration procedure for one transaction that the
/// Deriver flagged as funding `successor`'s vaults.
#[instrument(skip(tx, predecessor, successor, store), fields(
    predecessor = %predecessor.pool_address(),
    successor = %successor.pool_address(),
))]
pub async fn migrate(
    direction: MigrationDirection,
    tx: &EnhancedTransaction,
    predecessor: &dyn PoolConfig,
    successor: &dyn PoolConfig,
    store: &dyn Store,
) {
    if !predecessor.is_migrated() {
        if let Err(err) = migrate_holders(predecessor, successor, store).await {
            error!(%err, "holder migration step failed");
        }
    }

    let cursor = match store.get_or_create_cursor(successor.pool_address()).await {
        Ok(cursor) => Some(cursor),
        Err(err) => {
            error!(%err, "successor cursor load/create failed");
            None
        }
    };

    if let Some(mut cursor) = cursor {
        match replay(tx, successor, store).await {
            Ok(()) => {
                cursor.observe(tx.slot, tx.timestamp, &tx.signature);
                if let Err(err) = store.upsert_cursor(cursor).await {
                    error!(%err, "successor cursor persist failed");
                }
            }
            Err(err) => error!(%err, "replay through successor handlers failed"),
        }
    }

    if let Err(err) = store.mark_pool_migrated(predecessor.pool_address()).await {
        error!(%err, "marking predecessor migrated failed");
    }

    if let Err(err) = rewire_project_configs(direction, predecessor, successor, store).await {
        error!(%err, "project-config rewire failed");
    }
}

/// Step 1: mirror every non-pool holder row of `predecessor` into
/// `successor`'s holder table, rewriting only `pool_address`. Existing
/// target rows are left untouched (idempotent re-run safe).
async fn migrate_holders(
    predecessor: &dyn PoolConfig,
    successor: &dyn PoolConfig,
    store: &dyn Store,
) -> Result<(), MigrationError> {
    let holders = store.holders_for_pool(predecessor.pool_address()).await?;

    for mut holder in holders {
        if holder.holder_type == ingest_types::HolderType::Pool {
            continue;
        }
        // Trader rows key off `(address, base_mint, quote_mint)`, not
        // `pool_address` (§3), so this is the same row the successor will
        // see once its `pool_address` is rewritten below, not a separate
        // target row to existence-check. Idempotence instead checks
        // whether that rewrite already happened.
        if holder.pool_address == *successor.pool_address() {
            continue;
        }

        holder.pool_address = successor.pool_address().clone();
        store.upsert_holder(holder).await?;
    }

    Ok(())
}

/// Step 3: replays `tx` through the successor's swap/holder handlers
/// using the live-path Balance-Change Deriver variant (§4.1 point 5).
async fn replay(tx: &EnhancedTransaction, successor: &dyn PoolConfig, store: &dyn Store) -> Result<(), MigrationError> {
    let changes = ingest_derive::derive_live(tx, successor);
    let swaps = ingest_swap::build_and_persist(tx, successor, &changes, store).await?;

    for swap in &swaps {
        ingest_holders::apply(swap, successor, store).await?;
    }

    Ok(())
}

/// Step 5: rewires every project config pointing at the predecessor to
/// the successor, and flips the successor's status to active.
async fn rewire_project_configs(
    direction: MigrationDirection,
    predecessor: &dyn PoolConfig,
    successor: &dyn PoolConfig,
    store: &dyn Store,
) -> Result<(), MigrationError> {
    let predecessor_family = family_label(direction, predecessor.family());
    let successor_family = family_label(direction, successor.family());

    let configs = store.project_configs_for(predecessor_family, predecessor.pool_address().as_str()).await?;

    for config in configs {
        store
            .update_project_config(config.id, successor_family, successor.pool_address().as_str())
            .await?;
    }

    store.mark_pool_active(successor.pool_address()).await?;
    Ok(())
}

fn family_label(direction: MigrationDirection, family: ProtocolFamily) -> &'static str {
    match (direction, family) {
        (_, ProtocolFamily::BondingCurve) => "bonding_curve",
        (_, ProtocolFamily::Amm) => "amm",
        (_, ProtocolFamily::Cpmm) => "cpmm",
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ingest_adapters::test_support::InMemoryStore;
    use ingest_types::{Address, GenericPoolConfig, Holder, HolderType, ProjectConfig, TokenTransfer};
    use rust_decimal::Decimal;

    use super::*;

    fn predecessor() -> GenericPoolConfig {
        GenericPoolConfig::new(
            Address::from("Pred"),
            "Base",
            "Quote",
            Address::from("PredBaseVault"),
            Address::from("PredQuoteVault"),
            ProtocolFamily::BondingCurve,
        )
        .with_successor(Address::from("Succ"))
    }

    fn successor() -> GenericPoolConfig {
        GenericPoolConfig::new(
            Address::from("Succ"),
            "Base",
            "Quote",
            Address::from("SuccBaseVault"),
            Address::from("SuccQuoteVault"),
            ProtocolFamily::Amm,
        )
    }

    fn funding_tx() -> EnhancedTransaction {
        EnhancedTransaction {
            signature: "migrate-sig".into(),
            slot: 500,
            timestamp: Utc::now(),
            fee: 5000,
            fee_payer: Address::from("Succ"),
            r#type: "MIGRATE".into(),
            source: "TEST".into(),
            token_transfers: vec![TokenTransfer {
                mint: "Base".into(),
                from_user_account: Address::from("Succ"),
                to_user_account: Address::from("Alice"),
                from_token_account: Address::from("SuccBaseVault"),
                to_token_account: Address::from("AliceBaseAta"),
                token_amount: Decimal::new(3, 0),
            }],
            account_data: vec![],
            raw: None,
        }
    }

    /// §8 P11 / scenario 5: migration mirrors holders, flips the
    /// predecessor flag, replays into the successor, and rewires configs.
    #[tokio::test]
    async fn migration_satisfies_atomicity_of_effect() {
        let predecessor = predecessor();
        let successor = successor();
        let store = InMemoryStore::new();

        store
            .upsert_holder(Holder {
                address: Address::from("Alice"),
                holder_type: HolderType::RetailInvestors,
                pool_address: Address::from("Pred"),
                base_mint: "Base".into(),
                quote_mint: "Quote".into(),
                start_slot: 10,
                last_slot: 20,
                start_timestamp: Utc::now(),
                last_timestamp: Utc::now(),
                start_signature: "old-sig".into(),
                end_signature: "old-sig2".into(),
                base_change: Decimal::new(9, 0),
                quote_change: Decimal::new(-2, 0),
                sol_change: Decimal::ZERO,
                tx_count: 2,
            })
            .await
            .unwrap();
        store.seed_project_config(ProjectConfig { id: 1, pool_platform: "bonding_curve".into(), pool_id: "Pred".into() });

        migrate(MigrationDirection::BondingCurveToAmm, &funding_tx(), &predecessor, &successor, &store).await;

        let mirrored = store.get_holder(&Address::from("Alice"), "Base", "Quote").await.unwrap();
        assert!(mirrored.is_some());
        assert_eq!(mirrored.unwrap().pool_address, Address::from("Succ"));

        assert!(store.is_migrated(&Address::from("Pred")));

        let configs = store.project_configs_for("amm", "Succ").await.unwrap();
        assert_eq!(configs.len(), 1);

        let succ_swaps = store.swap_exists("migrate-sig", &Address::from("Alice")).await.unwrap();
        assert!(succ_swaps);
    }

    #[tokio::test]
    async fn rerunning_migration_is_idempotent() {
        let predecessor = predecessor();
        let successor = successor();
        let store = InMemoryStore::new();

        store
            .upsert_holder(Holder {
                address: Address::from("Alice"),
                holder_type: HolderType::RetailInvestors,
                pool_address: Address::from("Pred"),
                base_mint: "Base".into(),
                quote_mint: "Quote".into(),
                start_slot: 10,
                last_slot: 20,
                start_timestamp: Utc::now(),
                last_timestamp: Utc::now(),
                start_signature: "old-sig".into(),
                end_signature: "old-sig2".into(),
                base_change: Decimal::new(9, 0),
                quote_change: Decimal::new(-2, 0),
                sol_change: Decimal::ZERO,
                tx_count: 2,
            })
            .await
            .unwrap();

        migrate(MigrationDirection::BondingCurveToAmm, &funding_tx(), &predecessor, &successor, &store).await;
        let after_first = store.get_holder(&Address::from("Alice"), "Base", "Quote").await.unwrap().unwrap();

        migrate(MigrationDirection::BondingCurveToAmm, &funding_tx(), &predecessor, &successor, &store).await;
        let after_second = store.get_holder(&Address::from("Alice"), "Base", "Quote").await.unwrap().unwrap();

        assert_eq!(after_first, after_second);
    }
}
