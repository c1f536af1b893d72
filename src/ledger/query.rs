//! Typed read-only queries layered over [`LedgerRpc`].
//!
//! Each method performs exactly one logical read (the exchange rate also
//! needs the current height) and does not retry.

use super::LedgerRpc;
use crate::domain::{Address, Coin, Currency, Decimal};
use crate::error::EarnError;
use crate::network::AddressProvider;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LedgerQuery {
    ledger: Arc<dyn LedgerRpc>,
    contracts: Arc<AddressProvider>,
}

impl LedgerQuery {
    pub fn new(ledger: Arc<dyn LedgerRpc>, contracts: Arc<AddressProvider>) -> Self {
        Self { ledger, contracts }
    }

    pub fn chain_id(&self) -> &str {
        self.ledger.chain_id()
    }

    pub fn contracts(&self) -> &AddressProvider {
        &self.contracts
    }

    pub async fn current_height(&self) -> Result<u64, EarnError> {
        Ok(self.ledger.block_height().await?)
    }

    /// Native balance of `currency` in micro units; zero when the denom is absent.
    pub async fn account_balance(
        &self,
        address: &Address,
        currency: Currency,
    ) -> Result<u128, EarnError> {
        let coins = self.ledger.account_balance(address).await?;
        let amount = coins
            .iter()
            .find(|c| c.denom == currency.denom())
            .map(|c| c.amount)
            .unwrap_or(0);
        debug!("Balance address={} currency={} micro={}", address, currency, amount);
        Ok(amount)
    }

    /// Receipt-token balance for the market of `currency`, in micro units.
    pub async fn receipt_balance(
        &self,
        address: &Address,
        currency: Currency,
    ) -> Result<u128, EarnError> {
        let token = self.contracts.receipt_token(currency)?;
        let response = self
            .ledger
            .contract_query(token, &json!({ "balance": { "address": address.as_str() } }))
            .await?;
        let raw = string_field(&response, "balance")?;
        raw.parse::<u128>()
            .map_err(|e| parse_error(format!("Invalid receipt balance {:?}: {}", raw, e)))
    }

    /// Receipt-to-underlying rate of the market at the current height.
    pub async fn exchange_rate(&self, currency: Currency) -> Result<Decimal, EarnError> {
        let market = &self.contracts.market(self.contracts.underlying(currency)?)?.market;
        let height = self.current_height().await?;
        let response = self
            .ledger
            .contract_query(market, &json!({ "epoch_state": { "block_height": height } }))
            .await?;
        let rate = decimal_field(&response, "exchange_rate")?;
        if !rate.is_positive() {
            return Err(parse_error(format!("Non-positive exchange rate {}", rate)));
        }
        Ok(rate)
    }

    /// Per-block deposit rate reported by the market's overseer.
    pub async fn deposit_rate(&self, currency: Currency) -> Result<Decimal, EarnError> {
        let overseer = &self.contracts.market(currency)?.overseer;
        let response = self
            .ledger
            .contract_query(overseer, &json!({ "epoch_state": {} }))
            .await?;
        decimal_field(&response, "deposit_rate")
    }

    /// Convert `amount` micro units of `from` into micro units of `to`.
    pub async fn swap_rate(
        &self,
        amount: u128,
        from: Currency,
        to: Currency,
    ) -> Result<u128, EarnError> {
        if from == to {
            return Ok(amount);
        }
        let coin = self
            .ledger
            .swap_rate(&Coin::new(from.denom(), amount), to.denom())
            .await?;
        if coin.denom != to.denom() {
            return Err(parse_error(format!(
                "Swap returned {} instead of {}",
                coin.denom,
                to.denom()
            )));
        }
        Ok(coin.amount)
    }
}

fn parse_error(message: String) -> EarnError {
    EarnError::malformed_response(message)
}

fn string_field<'a>(response: &'a serde_json::Value, field: &str) -> Result<&'a str, EarnError> {
    response
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| parse_error(format!("Missing {} field", field)))
}

fn decimal_field(response: &serde_json::Value, field: &str) -> Result<Decimal, EarnError> {
    let raw = string_field(response, field)?;
    Decimal::from_str(raw).map_err(|e| parse_error(format!("Invalid {} {:?}: {}", field, raw, e)))
}
