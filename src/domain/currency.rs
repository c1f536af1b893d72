//! Currencies known to the client and their on-chain denominations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A denomination the client can hold, deposit, or report on.
///
/// Serializes as its generic code (`UST`, `KRW`, `aUST`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// TerraUSD, the settlement currency.
    #[serde(rename = "UST")]
    Ust,
    /// TerraKRW.
    #[serde(rename = "KRW")]
    Krw,
    /// Anchor receipt token for the UST market.
    #[serde(rename = "aUST")]
    Aust,
}

impl Currency {
    /// The currency all totals are normalized into.
    pub const SETTLEMENT: Currency = Currency::Ust;

    /// Generic display code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ust => "UST",
            Currency::Krw => "KRW",
            Currency::Aust => "aUST",
        }
    }

    /// Settlement denomination used on the ledger.
    pub fn denom(&self) -> &'static str {
        match self {
            Currency::Ust => "uusd",
            Currency::Krw => "ukrw",
            Currency::Aust => "uaust",
        }
    }

    /// Reverse of [`Currency::denom`].
    pub fn from_denom(denom: &str) -> Option<Currency> {
        match denom {
            "uusd" => Some(Currency::Ust),
            "ukrw" => Some(Currency::Krw),
            "uaust" => Some(Currency::Aust),
            _ => None,
        }
    }

    /// Native bank currencies (as opposed to CW20 receipt tokens).
    pub fn is_native(&self) -> bool {
        !self.is_receipt()
    }

    pub fn is_receipt(&self) -> bool {
        matches!(self, Currency::Aust)
    }

    pub fn is_settlement(&self) -> bool {
        *self == Self::SETTLEMENT
    }

    /// The native currency a receipt token redeems into.
    pub fn underlying(&self) -> Currency {
        match self {
            Currency::Aust => Currency::Ust,
            other => *other,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown currency: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    /// Accepts generic codes case-insensitively, or ledger denominations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(currency) = Currency::from_denom(trimmed) {
            return Ok(currency);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "UST" | "USD" => Ok(Currency::Ust),
            "KRW" => Ok(Currency::Krw),
            "AUST" => Ok(Currency::Aust),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}
