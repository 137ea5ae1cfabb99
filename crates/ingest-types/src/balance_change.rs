use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// An in-memory-only derived record: one signed amount delta for a single
/// `(address, mint)` pair observed in one transaction (§3). `mint ==
/// "sol"` (see `ingest_types::NATIVE_MINT`) denotes the chain's native
/// asset. Never persisted directly; C2/C3/C4 fold sequences of these into
/// the persisted swap/holder/wallet-stat rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressBalanceChange {
    pub slot: u64,
    pub timestamp: DateTime<Utc>,
    pub signature: String,
    pub address: Address,
    pub mint: String,
    pub amount_change: Decimal,
}

impl AddressBalanceChange {
    pub fn is_native(&self) -> bool {
        self.mint == crate::NATIVE_MINT
    }
}
