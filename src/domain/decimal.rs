//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Used for rates (exchange rate, deposit rate, APY) and gas prices. Amounts
//! that move on the ledger are integers in micro units, see [`super::amount`].

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless decimal numeric type for rate calculations.
///
/// Serializes to a JSON string so that rates such as `0.0000001` survive
/// clients that parse numbers as doubles.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s.trim()).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Checked multiplication, `None` on overflow.
    pub fn checked_mul(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_parse_roundtrip() {
        let test_cases = vec!["1.1", "0.0000001", "1000000", "0", "1.000013283"];

        for s in test_cases {
            let decimal = Decimal::from_str_canonical(s).expect("parse failed");
            let formatted = decimal.to_canonical_string();
            let reparsed = Decimal::from_str_canonical(&formatted).expect("reparse failed");
            assert_eq!(decimal, reparsed, "roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_decimal_canonical_strips_trailing_zeros() {
        let decimal = Decimal::from_str_canonical("0.150000").unwrap();
        assert_eq!(decimal.to_canonical_string(), "0.15");
    }

    #[test]
    fn test_decimal_json_serialization_is_string() {
        let decimal = Decimal::from_str_canonical("0.4906443").unwrap();
        let json = serde_json::to_value(decimal).unwrap();
        assert!(json.is_string());
        assert_eq!(json, serde_json::json!("0.4906443"));

        let back: Decimal = serde_json::from_value(json).unwrap();
        assert_eq!(back, decimal);
    }

    #[test]
    fn test_decimal_mul_by_block_count() {
        let rate = Decimal::from_str_canonical("0.0000001").unwrap();
        let apy = rate * Decimal::from(4_906_443u64);
        assert_eq!(apy.to_canonical_string(), "0.4906443");
    }

    #[test]
    fn test_decimal_checked_mul_overflow() {
        let huge = Decimal::from_str_canonical("79228162514264337593543950335").unwrap();
        assert!(huge.checked_mul(Decimal::from(4_906_443u64)).is_none());
        assert_eq!(
            Decimal::from_str_canonical("0.5")
                .unwrap()
                .checked_mul(Decimal::from(2u64)),
            Some(Decimal::from(1u64))
        );
    }

    #[test]
    fn test_decimal_sign_helpers() {
        assert!(Decimal::zero().is_zero());
        assert!(!Decimal::zero().is_positive());
        assert!(Decimal::from_str_canonical("1.1").unwrap().is_positive());
        assert!(!Decimal::from_str_canonical("-1").unwrap().is_positive());
    }
}
