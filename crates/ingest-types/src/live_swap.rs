use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Action classification for a live-path swap (§4.8 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapAction {
    Buy,
    Sell,
    AddLiquidity,
    RemoveLiquidity,
    Unknown,
}

/// Role derived from [`SwapAction`] for the persisted row (§4.8 step 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayerType {
    Buyer,
    Seller,
    LiquidityProvider,
    LiquidityRemover,
    Unknown,
}

impl From<SwapAction> for PayerType {
    fn from(action: SwapAction) -> Self {
        match action {
            SwapAction::Buy => PayerType::Buyer,
            SwapAction::Sell => PayerType::Seller,
            SwapAction::AddLiquidity => PayerType::LiquidityProvider,
            SwapAction::RemoveLiquidity => PayerType::LiquidityRemover,
            SwapAction::Unknown => PayerType::Unknown,
        }
    }
}

/// The live path's single summarized output row (§3, §4.8 step 7):
/// `SwapTransaction`, insert-if-new by `signature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSwapTransaction {
    pub signature: String,
    pub pool_address: Address,
    pub payer: Address,
    pub base_mint: String,
    pub quote_mint: String,
    pub base_change: Decimal,
    pub quote_change: Decimal,
    pub action: SwapAction,
    pub payer_type: PayerType,
    pub is_success: bool,
    /// Seconds; clamped at 0 (§4.8 step 7: "milliseconds / 1000, clamped
    /// at 0").
    pub timestamp: DateTime<Utc>,
}
