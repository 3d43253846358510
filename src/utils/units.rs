//! Conversions between decimal token/native amounts and on-chain integer units

use alloy::primitives::U256;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// The settlement token uses 6 decimal places (1 token = 1_000_000 base units)
pub const TOKEN_DECIMAL_FACTOR: u64 = 1_000_000;

/// Wei per unit of the native currency
pub const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Wei per gwei
pub const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Fixed gas funding amount sent to each donor wallet: 0.001 of the native unit
pub const GAS_FUND_WEI: u64 = 1_000_000_000_000_000;

/// Convert a decimal token amount to integer base units, rounding to the
/// nearest unit. Returns `None` for negative amounts or values that do not
/// fit the integer range.
pub fn token_to_base_units(amount: Decimal) -> Option<U256> {
    if amount.is_sign_negative() {
        return None;
    }
    let scaled = (amount * Decimal::from(TOKEN_DECIMAL_FACTOR)).round();
    scaled.to_u128().map(U256::from)
}

/// Convert integer base units back to a decimal token amount
pub fn token_from_base_units(raw: U256) -> Option<Decimal> {
    let units = u128::try_from(raw).ok()?;
    let units = Decimal::from_u128(units)?;
    Some(units / Decimal::from(TOKEN_DECIMAL_FACTOR))
}

/// Convert a gwei gas price to wei
pub fn gwei_to_wei(gwei: u64) -> u128 {
    u128::from(gwei) * u128::from(WEI_PER_GWEI)
}

/// Gas fee charged for a transfer, in the native unit.
///
/// Computed from the configured gas-price ceiling and gas limit rather than
/// the receipt's consumed gas; see DESIGN.md.
pub fn gas_fee_ether(max_gas_price_gwei: u64, gas_limit: u64) -> Option<Decimal> {
    let total_wei = gwei_to_wei(max_gas_price_gwei) * u128::from(gas_limit);
    let total = Decimal::from_u128(total_wei)?;
    Some(total / Decimal::from(WEI_PER_ETHER))
}
