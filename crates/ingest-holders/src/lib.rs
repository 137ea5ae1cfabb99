//! Holder Aggregator (C3, §4.3).
//!
//! `apply` folds one persisted [`Swap`] into two running aggregates: a
//! trader row keyed by `(swap.address, base_mint, quote_mint)` and the
//! pool's own row keyed by `(pool_address, pool_address, base_mint,
//! quote_mint)`. Both are T+1 roll-ups: the `[start, last]` activity
//! bracket widens monotonically and the running sums/`tx_count`
//! accumulate in place.

pub mod error;

use ingest_adapters::Store;
use ingest_types::{Holder, HolderType, PoolConfig, ProtocolFamily, Swap};
use rust_decimal::Decimal;

pub use error::HolderError;

/// Applies one swap to both the trader row and the pool's own row.
pub async fn apply(swap: &Swap, pool: &dyn PoolConfig, store: &dyn Store) -> Result<(), HolderError> {
    let holder_type = classify(&swap.address, pool.pool_address(), store).await?;

    apply_row(
        swap,
        pool,
        store,
        &swap.address,
        holder_type,
        swap.trader_base_change,
        swap.trader_quote_change,
        swap.trader_sol_change,
    )
    .await?;

    let pool_sol_change = pool_row_sol_change(swap, pool);
    apply_row(
        swap,
        pool,
        store,
        pool.pool_address(),
        HolderType::Pool,
        swap.pool_base_change,
        swap.pool_quote_change,
        pool_sol_change,
    )
    .await?;

    Ok(())
}

/// §4.3 classification precedence: project registry first, then
/// pool-address equality, then retail. P7: a project-registered address
/// classifies as `project` even when it equals the pool address.
async fn classify(address: &ingest_types::Address, pool_address: &ingest_types::Address, store: &dyn Store) -> Result<HolderType, HolderError> {
    if store.is_project_address(address).await? || store.is_extra_project_address(address).await? {
        return Ok(HolderType::Project);
    }
    if address == pool_address {
        return Ok(HolderType::Pool);
    }
    Ok(HolderType::RetailInvestors)
}

/// §4.3's family-specific pool-row native leg. For every family but one,
/// the pool row never carries a native change of its own (native deltas
/// on vault/pool accounts are folded into `trader_sol_change` whenever the
/// pool itself is the swap's `address`, i.e. the primary row already
/// accounts for it once). The one exception family sums the native delta
/// observed on the pool's own holder row a second time; this crate has no
/// narrower signal than `trader_sol_change` to draw that second sum from,
/// so it reuses it when `swap.address == pool_address`, matching the one
/// case that can occur with the current `Swap` shape.
///
/// TODO: thread a dedicated `pool_sol_change` field through `Swap` instead
/// of inferring it here, if a family ever needs it independent of
/// `swap.address`.
fn pool_row_sol_change(swap: &Swap, pool: &dyn PoolConfig) -> Decimal {
    if pool.family() == ProtocolFamily::Cpmm && swap.address == *pool.pool_address() {
        swap.trader_sol_change
    } else {
        Decimal::ZERO
    }
}

#[allow(clippy::too_many_arguments)]
async fn apply_row(
    swap: &Swap,
    pool: &dyn PoolConfig,
    store: &dyn Store,
    address: &ingest_types::Address,
    holder_type: HolderType,
    base_change: Decimal,
    quote_change: Decimal,
    sol_change: Decimal,
) -> Result<(), HolderError> {
    let existing = store.get_holder(address, pool.base_mint(), pool.quote_mint()).await?;

    let holder = match existing {
        None => Holder {
            address: address.clone(),
            holder_type,
            pool_address: pool.pool_address().clone(),
            base_mint: pool.base_mint().to_string(),
            quote_mint: pool.quote_mint().to_string(),
            start_slot: swap.slot,
            last_slot: swap.slot,
            start_timestamp: swap.timestamp,
            last_timestamp: swap.timestamp,
            start_signature: swap.signature.clone(),
            end_signature: swap.signature.clone(),
            base_change,
            quote_change,
            sol_change,
            tx_count: 1,
        },
        Some(mut holder) => {
            if swap.slot > holder.last_slot {
                holder.last_slot = swap.slot;
                holder.last_timestamp = swap.timestamp;
                holder.end_signature = swap.signature.clone();
            }
            if holder.start_slot == 0 || swap.slot < holder.start_slot {
                holder.start_slot = swap.slot;
                holder.start_timestamp = swap.timestamp;
                holder.start_signature = swap.signature.clone();
            }
            holder.base_change += base_change;
            holder.quote_change += quote_change;
            holder.sol_change += sol_change;
            holder.tx_count += 1;
            holder.holder_type = holder_type;
            holder
        }
    };

    store.upsert_holder(holder).await?;
    Ok(())
}
