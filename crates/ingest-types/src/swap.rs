use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// One persisted swap row (§3). Identical shape across every protocol
/// family's swap table; uniqueness key is `(signature, address)`.
///
/// For secondary swaps (any address other than the fee payer) the `pool_*`
/// fields are always zero, per §4.2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    pub slot: u64,
    pub timestamp: DateTime<Utc>,
    pub pool_address: Address,
    pub signature: String,
    pub fee: u64,
    pub address: Address,
    pub base_mint: String,
    pub quote_mint: String,
    pub trader_base_change: Decimal,
    pub trader_quote_change: Decimal,
    pub trader_sol_change: Decimal,
    pub pool_base_change: Decimal,
    pub pool_quote_change: Decimal,
}

impl Swap {
    /// `true` for the fee-payer's own row (the "primary" swap, §4.2).
    pub fn is_primary(&self, fee_payer: &Address) -> bool {
        &self.address == fee_payer
    }
}
