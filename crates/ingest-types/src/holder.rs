use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Classification of a holder row (§3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderType {
    Project,
    Pool,
    RetailInvestors,
}

/// A running per-`(address, pool_address, base_mint, quote_mint)` aggregate
/// (§3). T+1 roll-up: `start_*`/`last_*` form the activity bracket,
/// `*_change`/`tx_count` are running sums updated in place (§4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    pub address: Address,
    pub holder_type: HolderType,
    pub pool_address: Address,
    pub base_mint: String,
    pub quote_mint: String,
    pub start_slot: u64,
    pub last_slot: u64,
    pub start_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
    pub start_signature: String,
    pub end_signature: String,
    pub base_change: Decimal,
    pub quote_change: Decimal,
    pub sol_change: Decimal,
    pub tx_count: u64,
}

impl Holder {
    /// §3 invariant.
    pub fn bracket_is_monotonic(&self) -> bool {
        self.start_slot <= self.last_slot
    }

    /// §3 invariant: for the pool row itself.
    pub fn is_valid_pool_row(&self) -> bool {
        self.holder_type != HolderType::Pool || self.address == self.pool_address
    }
}
