use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Running human-readable + raw balance per `(owner, mint)` (§3, C4).
///
/// `balance_readable` never goes negative: updates that would drive it
/// below zero are clamped by the caller (`ingest-swap::wallet_stat`), a
/// documented oddity preserved per §9/§4.4 — this type itself does not
/// enforce the invariant, it only stores whatever the updater decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTokenStat {
    pub owner_address: Address,
    pub mint: String,
    pub decimals: u32,
    pub balance_raw: i128,
    pub balance_readable: Decimal,
    pub slot: u64,
    pub block_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
