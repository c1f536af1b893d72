//! In-memory ledger for testing without network calls.

use super::{BroadcastResult, LedgerError, LedgerRpc};
use crate::domain::{mul_floor, Address, Coin, Decimal};
use crate::signer::SignedTransaction;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock ledger serving predefined state and recording broadcasts.
#[derive(Debug, Clone)]
pub struct MockLedger {
    chain_id: String,
    height: u64,
    bank: HashMap<Address, Vec<Coin>>,
    cw20: HashMap<(Address, Address), u128>,
    exchange_rates: HashMap<Address, Decimal>,
    deposit_rates: HashMap<Address, Decimal>,
    swap_rates: HashMap<(String, String), Decimal>,
    broadcast_result: Option<BroadcastResult>,
    unreachable: bool,
    broadcasts: Arc<Mutex<Vec<SignedTransaction>>>,
}

impl MockLedger {
    /// Create a new mock ledger with empty state at height 1.
    pub fn new(chain_id: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            height: 1,
            bank: HashMap::new(),
            cw20: HashMap::new(),
            exchange_rates: HashMap::new(),
            deposit_rates: HashMap::new(),
            swap_rates: HashMap::new(),
            broadcast_result: None,
            unreachable: false,
            broadcasts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the latest block height.
    pub fn with_height(mut self, height: u64) -> Self {
        self.height = height;
        self
    }

    /// Credit a native bank balance.
    pub fn with_balance(mut self, address: &Address, denom: &str, amount: u128) -> Self {
        let coins = self.bank.entry(address.clone()).or_default();
        match coins.iter_mut().find(|c| c.denom == denom) {
            Some(coin) => coin.amount = amount,
            None => coins.push(Coin::new(denom, amount)),
        }
        self
    }

    /// Credit a CW20 token balance held at `token`.
    pub fn with_token_balance(mut self, token: &Address, holder: &Address, amount: u128) -> Self {
        self.cw20.insert((token.clone(), holder.clone()), amount);
        self
    }

    /// Exchange rate reported by a market contract's `epoch_state`.
    pub fn with_exchange_rate(mut self, market: &Address, rate: Decimal) -> Self {
        self.exchange_rates.insert(market.clone(), rate);
        self
    }

    /// Deposit rate reported by an overseer contract's `epoch_state`.
    pub fn with_deposit_rate(mut self, overseer: &Address, rate: Decimal) -> Self {
        self.deposit_rates.insert(overseer.clone(), rate);
        self
    }

    /// Units of `ask_denom` returned per unit of `offer_denom`.
    pub fn with_swap_rate(mut self, offer_denom: &str, ask_denom: &str, rate: Decimal) -> Self {
        self.swap_rates
            .insert((offer_denom.to_string(), ask_denom.to_string()), rate);
        self
    }

    /// Result returned for every broadcast instead of a generated success.
    pub fn with_broadcast_result(mut self, result: BroadcastResult) -> Self {
        self.broadcast_result = Some(result);
        self
    }

    /// Make every call fail with a network error.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Transactions broadcast so far.
    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.broadcasts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn check_reachable(&self) -> Result<(), LedgerError> {
        if self.unreachable {
            return Err(LedgerError::NetworkError("mock node unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    async fn account_balance(&self, address: &Address) -> Result<Vec<Coin>, LedgerError> {
        self.check_reachable()?;
        Ok(self.bank.get(address).cloned().unwrap_or_default())
    }

    async fn contract_query(
        &self,
        contract: &Address,
        query: &serde_json::Value,
    ) -> Result<serde_json::Value, LedgerError> {
        self.check_reachable()?;

        if let Some(holder) = query.pointer("/balance/address").and_then(|v| v.as_str()) {
            let balance = self
                .cw20
                .get(&(contract.clone(), Address::new(holder)))
                .copied()
                .unwrap_or(0);
            return Ok(serde_json::json!({ "balance": balance.to_string() }));
        }

        if query.get("epoch_state").is_some() {
            if let Some(rate) = self.exchange_rates.get(contract) {
                return Ok(serde_json::json!({
                    "exchange_rate": rate.to_canonical_string(),
                    "aterra_supply": "0",
                }));
            }
            if let Some(rate) = self.deposit_rates.get(contract) {
                return Ok(serde_json::json!({
                    "deposit_rate": rate.to_canonical_string(),
                    "prev_aterra_supply": "0",
                    "prev_exchange_rate": "1",
                    "last_executed_height": self.height,
                }));
            }
        }

        Err(LedgerError::HttpError {
            status: 500,
            message: format!("contract {} cannot answer {}", contract, query),
        })
    }

    async fn block_height(&self) -> Result<u64, LedgerError> {
        self.check_reachable()?;
        Ok(self.height)
    }

    async fn swap_rate(&self, offer: &Coin, ask_denom: &str) -> Result<Coin, LedgerError> {
        self.check_reachable()?;
        if offer.denom == ask_denom {
            return Ok(Coin::new(ask_denom, offer.amount));
        }
        let rate = self
            .swap_rates
            .get(&(offer.denom.clone(), ask_denom.to_string()))
            .ok_or_else(|| {
                LedgerError::Other(format!("no swap route {} -> {}", offer.denom, ask_denom))
            })?;
        let amount = mul_floor(offer.amount, *rate)
            .map_err(|e| LedgerError::Other(e.to_string()))?;
        Ok(Coin::new(ask_denom, amount))
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResult, LedgerError> {
        self.check_reachable()?;
        let tx_hash = tx.hash().map_err(|e| LedgerError::Other(e.to_string()))?;
        self.broadcasts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx.clone());

        Ok(self
            .broadcast_result
            .clone()
            .unwrap_or_else(|| BroadcastResult::Success {
                tx_hash,
                height: self.height,
                raw_log: "[]".to_string(),
            }))
    }
}
