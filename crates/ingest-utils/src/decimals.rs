use rust_decimal::Decimal;

/// Hard-coded decimal assumptions used when converting swap deltas into
/// wallet-stat updates (§4.2). These are wrong for any mint that doesn't
/// happen to use these exact decimal counts, but the spec requires
/// preserving them as-is.
///
/// TODO: read decimals from a mint registry instead of assuming them;
/// tracked as an open question in §9, not fixed here.
pub const BASE_MINT_DECIMALS: u32 = 6;
pub const QUOTE_MINT_DECIMALS: u32 = 9;
pub const NATIVE_DECIMALS: u32 = 9;

/// Converts a native-unit signed delta (smallest units) to whole-unit
/// decimal form, the same `/ 10^9` conversion §4.2 requires before handing
/// a native balance change to the Wallet-Stat Updater.
pub fn native_units_to_readable(delta: i128) -> Decimal {
    Decimal::from_i128_with_scale(delta, 0) / Decimal::from(10u64.pow(NATIVE_DECIMALS))
}
