//! Static per-network configuration: LCD endpoint, gas defaults, contracts.
//!
//! Built once when the client is constructed and never mutated afterwards.

use crate::domain::{Address, Currency, Decimal};
use crate::error::EarnError;
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gas prices per denomination plus the estimate multiplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasConfig {
    pub gas_prices: BTreeMap<String, Decimal>,
    pub gas_adjustment: Decimal,
}

impl GasConfig {
    pub fn new(gas_prices: BTreeMap<String, Decimal>, gas_adjustment: Decimal) -> Self {
        Self {
            gas_prices,
            gas_adjustment,
        }
    }

    /// Gas price for `denom`, zero when the network charges nothing in it.
    pub fn price_of(&self, denom: &str) -> Decimal {
        self.gas_prices.get(denom).copied().unwrap_or_default()
    }
}

/// Contracts backing one deposit market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContracts {
    pub market: Address,
    pub a_token: Address,
    pub overseer: Address,
}

/// Currency → market contract table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressProvider {
    markets: BTreeMap<Currency, MarketContracts>,
}

impl AddressProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_market(mut self, currency: Currency, contracts: MarketContracts) -> Self {
        self.markets.insert(currency, contracts);
        self
    }

    /// Parse a table such as `{"UST": {"market": .., "aToken": .., "overseer": ..}}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// True when `currency` is a native stable with a deposit market.
    pub fn is_market(&self, currency: Currency) -> bool {
        currency.is_native() && self.markets.contains_key(&currency)
    }

    /// Market contracts for a native currency.
    pub fn market(&self, currency: Currency) -> Result<&MarketContracts, EarnError> {
        if !currency.is_native() {
            return Err(EarnError::UnsupportedCurrency(currency.to_string()));
        }
        self.markets
            .get(&currency)
            .ok_or_else(|| EarnError::UnsupportedCurrency(currency.to_string()))
    }

    /// The native currency a currency settles into, provided its market exists.
    pub fn underlying(&self, currency: Currency) -> Result<Currency, EarnError> {
        let underlying = currency.underlying();
        self.market(underlying)?;
        Ok(underlying)
    }

    /// Receipt-token contract for `currency` (either the native or the receipt code).
    pub fn receipt_token(&self, currency: Currency) -> Result<&Address, EarnError> {
        let underlying = self.underlying(currency)?;
        Ok(&self.market(underlying)?.a_token)
    }
}

/// Everything needed to talk to one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub lcd_url: String,
    pub chain_id: String,
    pub gas: GasConfig,
    pub contracts: AddressProvider,
}

impl NetworkConfig {
    /// Columbus-4 defaults.
    pub fn mainnet() -> Self {
        Self {
            lcd_url: "https://lcd.terra.dev".to_string(),
            chain_id: "columbus-4".to_string(),
            gas: default_gas(),
            contracts: AddressProvider::new().with_market(
                Currency::Ust,
                MarketContracts {
                    market: Address::new("terra1sepfj7s0aeg5967uxnfk4thzlerrsktkpelm5s"),
                    a_token: Address::new("terra1hzh9vpxhsk8253se0vv5jj6etdvxu3nv8z07zu"),
                    overseer: Address::new("terra1tmnqgvg567ypvsvk6rwsga3srp7e3lg6u0elp8"),
                },
            ),
        }
    }

    /// Tequila-0004 defaults.
    pub fn testnet() -> Self {
        Self {
            lcd_url: "https://tequila-lcd.terra.dev".to_string(),
            chain_id: "tequila-0004".to_string(),
            gas: default_gas(),
            contracts: AddressProvider::new().with_market(
                Currency::Ust,
                MarketContracts {
                    market: Address::new("terra15dwd5mj8v59wpj0wvt233mf5efdff808c5tkal"),
                    a_token: Address::new("terra1ajt556dpzvjwl0kl5tzku3fc3p3knkg9mkv8jl"),
                    overseer: Address::new("terra1qljxd0y3j3gk97025qvl3lgq8ygup4gsksvaxv"),
                },
            ),
        }
    }
}

fn default_gas() -> GasConfig {
    let mut prices = BTreeMap::new();
    prices.insert(
        Currency::Ust.denom().to_string(),
        Decimal::new(RustDecimal::new(15, 2)),
    );
    GasConfig::new(prices, Decimal::new(RustDecimal::new(14, 1)))
}
