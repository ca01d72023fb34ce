use primitive_types::U256;

use crate::error::EngineError;

/// Internal fixed point scale (18 decimals). Debt, USD values and health
/// factors are all expressed in this unit.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Lifts an answer from a default 8-decimal feed to the 18-decimal
/// internal scale.
pub const ADDITIONAL_FEED_PRECISION: u128 = 10_000_000_000;

/// Decimals of a collateral asset registered without explicit precision.
pub const DEFAULT_ASSET_DECIMALS: u8 = 18;

/// Decimals of a price feed registered without explicit precision.
pub const DEFAULT_FEED_DECIMALS: u8 = 8;

/// Largest accepted decimals for an asset or a feed.
pub const MAX_DECIMALS: u8 = 38;

/// Denominator for percentage parameters.
pub const PERCENT: u128 = 100;

/// Widen to 256 bits.
#[inline]
pub fn wide(value: u128) -> U256 {
    U256::from(value)
}

/// Narrow back to `u128`, failing if the value does not fit.
pub fn narrow(value: U256) -> Result<u128, EngineError> {
    if value > U256::from(u128::MAX) {
        return Err(EngineError::ArithmeticOverflow);
    }
    Ok(value.as_u128())
}

/// Narrow back to `u128`, clamping at `u128::MAX`.
pub fn saturating_narrow(value: U256) -> u128 {
    narrow(value).unwrap_or(u128::MAX)
}

/// `10^decimals` at 256 bits.
pub fn pow10(decimals: u8) -> U256 {
    U256::exp10(decimals as usize)
}

pub fn checked_mul(a: U256, b: U256) -> Result<U256, EngineError> {
    a.checked_mul(b).ok_or(EngineError::ArithmeticOverflow)
}

pub fn checked_div(a: U256, b: U256) -> Result<U256, EngineError> {
    if b.is_zero() {
        return Err(EngineError::ArithmeticOverflow);
    }
    Ok(a / b)
}

/// `a * b / denominator`, multiplying at 256 bits before dividing.
/// Truncates toward zero.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, EngineError> {
    let product = checked_mul(wide(a), wide(b))?;
    narrow(checked_div(product, wide(denominator))?)
}

/// `amount * pct / 100`, truncating.
pub fn percent_of(amount: u128, pct: u128) -> Result<u128, EngineError> {
    mul_div(amount, pct, PERCENT)
}

/// Converts a strictly positive feed answer to an unsigned wide integer.
pub fn positive_price(answer: i128) -> Result<U256, EngineError> {
    if answer <= 0 {
        return Err(EngineError::InvalidPrice);
    }
    Ok(U256::from(answer as u128))
}
