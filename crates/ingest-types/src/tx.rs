use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// One leg of a token transfer inside an enhanced transaction (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub mint: String,
    pub from_user_account: Address,
    pub to_user_account: Address,
    pub from_token_account: Address,
    pub to_token_account: Address,
    pub token_amount: Decimal,
}

/// One native-balance delta entry inside an enhanced transaction (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDataEntry {
    pub account: Address,
    /// Signed delta, smallest native units.
    pub native_balance_change: i128,
}

/// The externally-produced "enhanced transaction" record this engine parses.
///
/// `raw` preserves the full opaque provider payload as bytes for storage
/// (§3, §4.6: "serialize the full record as opaque bytes"); nothing in
/// this crate inspects it beyond that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedTransaction {
    pub signature: String,
    pub slot: u64,
    pub timestamp: DateTime<Utc>,
    pub fee: u64,
    /// May be empty; see §4.2/§7 "missing fee payer" handling.
    pub fee_payer: Address,
    pub r#type: String,
    pub source: String,
    pub token_transfers: Vec<TokenTransfer>,
    pub account_data: Vec<AccountDataEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Vec<u8>>,
}

impl EnhancedTransaction {
    pub fn has_fee_payer(&self) -> bool {
        !self.fee_payer.is_empty()
    }
}
