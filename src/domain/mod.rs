//! Domain types for the Anchor Earn client.
//!
//! This module provides:
//! - Lossless rate handling via the Decimal wrapper
//! - Natural/micro amount conversion
//! - Currencies and their ledger denominations
//! - Address and Coin primitives

pub mod amount;
pub mod currency;
pub mod decimal;
pub mod primitives;

pub use amount::{div_floor, mul_floor, to_micro, to_natural, AmountError, MICRO_FACTOR};
pub use currency::{Currency, UnknownCurrency};
pub use decimal::Decimal;
pub use primitives::{Address, AddressParseError, Coin};
