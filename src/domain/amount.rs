//! Conversion between natural decimal amounts and integer micro units.
//!
//! One natural unit equals 10^6 micro units. Caller-supplied amounts are
//! rounded half away from zero; rate-derived amounts are floored so the
//! client never asks the chain for more than a position is worth.

use super::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

/// Micro units per natural unit.
pub const MICRO_FACTOR: u128 = 1_000_000;

const MICRO_DIGITS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("not a decimal number: {0:?}")]
    Malformed(String),
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("amount out of range: {0}")]
    Overflow(String),
    #[error("conversion rate must be positive, got {0}")]
    InvalidRate(String),
}

/// Convert a natural decimal string (e.g. `"0.01"`) into micro units.
pub fn to_micro(natural: &str) -> Result<u128, AmountError> {
    let trimmed = natural.trim();
    let value = RustDecimal::from_str(trimmed)
        .map_err(|_| AmountError::Malformed(natural.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative(natural.to_string()));
    }

    let micro = value
        .checked_mul(RustDecimal::from(MICRO_FACTOR as u64))
        .ok_or_else(|| AmountError::Overflow(natural.to_string()))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    micro
        .abs()
        .to_u128()
        .ok_or_else(|| AmountError::Overflow(natural.to_string()))
}

/// Format micro units as a natural decimal string without trailing zeros.
pub fn to_natural(micro: u128) -> String {
    let whole = micro / MICRO_FACTOR;
    let frac = micro % MICRO_FACTOR;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = MICRO_DIGITS);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// `floor(micro * rate)`, e.g. receipt tokens to their underlying value.
pub fn mul_floor(micro: u128, rate: Decimal) -> Result<u128, AmountError> {
    if rate.inner().is_sign_negative() && !rate.is_zero() {
        return Err(AmountError::InvalidRate(rate.to_canonical_string()));
    }
    let value = RustDecimal::from_u128(micro)
        .ok_or_else(|| AmountError::Overflow(micro.to_string()))?;
    value
        .checked_mul(rate.inner())
        .and_then(|product| product.floor().to_u128())
        .ok_or_else(|| AmountError::Overflow(micro.to_string()))
}

/// `floor(micro / rate)`, e.g. a settlement amount to receipt tokens.
pub fn div_floor(micro: u128, rate: Decimal) -> Result<u128, AmountError> {
    if !rate.is_positive() {
        return Err(AmountError::InvalidRate(rate.to_canonical_string()));
    }
    let value = RustDecimal::from_u128(micro)
        .ok_or_else(|| AmountError::Overflow(micro.to_string()))?;
    value
        .checked_div(rate.inner())
        .and_then(|quotient| quotient.floor().to_u128())
        .ok_or_else(|| AmountError::Overflow(micro.to_string()))
}
