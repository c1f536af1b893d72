//! Balance and market snapshots across several currencies.
//!
//! Per-currency reads fan out concurrently; totals are accumulated in micro
//! units of the settlement currency and converted to natural units once.

use super::output::Chain;
use crate::domain::{mul_floor, to_natural, Address, Currency, Decimal};
use crate::error::EarnError;
use crate::ledger::LedgerQuery;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Blocks produced per year, used to annualize per-block deposit rates.
pub const BLOCKS_PER_YEAR: u64 = 4_906_443;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub currency: Currency,
    pub account_balance: String,
    pub deposit_balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceOutput {
    pub chain: Chain,
    pub network: String,
    pub height: u64,
    pub address: Address,
    pub balances: Vec<BalanceEntry>,
    pub total_balance: String,
    pub total_deposit: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketEntry {
    pub currency: Currency,
    pub liquidity: String,
    #[serde(rename = "APY")]
    pub apy: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOutput {
    pub chain: Chain,
    pub network: String,
    pub height: u64,
    pub markets: Vec<MarketEntry>,
}

/// Micro amounts fetched for one currency.
struct Holding {
    currency: Currency,
    account: u128,
    deposit: u128,
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    query: LedgerQuery,
    default_address: Option<Address>,
}

impl Aggregator {
    pub fn new(query: LedgerQuery, default_address: Option<Address>) -> Self {
        Self {
            query,
            default_address,
        }
    }

    pub async fn balance(
        &self,
        currencies: &[Currency],
        address: Option<&Address>,
    ) -> Result<BalanceOutput, EarnError> {
        for currency in currencies {
            self.query.contracts().market(*currency)?;
        }
        let address = address
            .or(self.default_address.as_ref())
            .cloned()
            .ok_or(EarnError::AddressRequired)?;
        info!("Balance requested address={} currencies={:?}", address, currencies);

        let fetches = currencies
            .iter()
            .map(|currency| self.holding(&address, *currency));
        let (holdings, height) =
            futures::try_join!(try_join_all(fetches), self.query.current_height())?;

        let settled = try_join_all(holdings.iter().map(|h| self.settle(h))).await?;
        let (total_balance, total_deposit) = settled.iter().try_fold(
            (0u128, 0u128),
            |(b, d), (account, deposit)| {
                b.checked_add(*account)
                    .zip(d.checked_add(*deposit))
                    .ok_or_else(|| EarnError::malformed_response("Balance total overflowed"))
            },
        )?;

        let balances = holdings
            .iter()
            .map(|h| BalanceEntry {
                currency: h.currency,
                account_balance: to_natural(h.account),
                deposit_balance: to_natural(h.deposit),
            })
            .collect();

        Ok(BalanceOutput {
            chain: Chain::Terra,
            network: self.query.chain_id().to_string(),
            height,
            address,
            balances,
            total_balance: to_natural(total_balance),
            total_deposit: to_natural(total_deposit),
            created_at: Utc::now(),
        })
    }

    /// Markets for every currency with a live deposit market; others are skipped.
    pub async fn market(&self, currencies: &[Currency]) -> Result<MarketOutput, EarnError> {
        let tradable: Vec<Currency> = currencies
            .iter()
            .copied()
            .filter(|c| self.query.contracts().is_market(*c))
            .collect();
        info!("Market requested currencies={:?}", tradable);

        let fetches = tradable.iter().map(|currency| self.market_entry(*currency));
        let (markets, height) =
            futures::try_join!(try_join_all(fetches), self.query.current_height())?;

        Ok(MarketOutput {
            chain: Chain::Terra,
            network: self.query.chain_id().to_string(),
            height,
            markets,
        })
    }

    async fn holding(&self, address: &Address, currency: Currency) -> Result<Holding, EarnError> {
        let (account, receipt, rate) = futures::try_join!(
            self.query.account_balance(address, currency),
            self.query.receipt_balance(address, currency),
            self.query.exchange_rate(currency),
        )?;
        let deposit = mul_floor(receipt, rate).map_err(EarnError::malformed_response)?;
        debug!(
            "Holding currency={} account={} receipt={} rate={} deposit={}",
            currency, account, receipt, rate, deposit
        );
        Ok(Holding {
            currency,
            account,
            deposit,
        })
    }

    /// Both sides of a holding in settlement micro units.
    async fn settle(&self, holding: &Holding) -> Result<(u128, u128), EarnError> {
        if holding.currency.is_settlement() {
            return Ok((holding.account, holding.deposit));
        }
        let (account, deposit) = futures::try_join!(
            self.to_settlement(holding.account, holding.currency),
            self.to_settlement(holding.deposit, holding.currency),
        )?;
        Ok((account, deposit))
    }

    async fn to_settlement(&self, micro: u128, currency: Currency) -> Result<u128, EarnError> {
        if micro == 0 {
            return Ok(0);
        }
        self.query
            .swap_rate(micro, currency, Currency::SETTLEMENT)
            .await
    }

    async fn market_entry(&self, currency: Currency) -> Result<MarketEntry, EarnError> {
        let market = self.query.contracts().market(currency)?.market.clone();
        let (liquidity, rate) = futures::try_join!(
            self.query.account_balance(&market, currency),
            self.query.deposit_rate(currency),
        )?;
        let apy = rate
            .checked_mul(Decimal::from(BLOCKS_PER_YEAR))
            .ok_or_else(|| {
                EarnError::malformed_response(format!("Deposit rate {} out of range", rate))
            })?;
        Ok(MarketEntry {
            currency,
            liquidity: to_natural(liquidity),
            apy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerRpc, MockLedger};
    use crate::network::{AddressProvider, MarketContracts};
    use std::sync::Arc;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn ust() -> MarketContracts {
        MarketContracts {
            market: Address::new("terra1market"),
            a_token: Address::new("terra1atoken"),
            overseer: Address::new("terra1overseer"),
        }
    }

    fn aggregator(mock: MockLedger, default_address: Option<Address>) -> Aggregator {
        let provider = AddressProvider::new().with_market(Currency::Ust, ust());
        let ledger: Arc<dyn LedgerRpc> = Arc::new(mock);
        Aggregator::new(LedgerQuery::new(ledger, Arc::new(provider)), default_address)
    }

    #[tokio::test]
    async fn test_deposit_balance_uses_exchange_rate() {
        let user = Address::new("terra1user");
        let mock = MockLedger::new("columbus-4")
            .with_height(9)
            .with_balance(&user, "uusd", 2_500_000)
            .with_token_balance(&Address::new("terra1atoken"), &user, 1_000_000)
            .with_exchange_rate(&Address::new("terra1market"), dec("1.0123456789"));
        let out = aggregator(mock, Some(user.clone()))
            .balance(&[Currency::Ust], None)
            .await
            .unwrap();

        assert_eq!(out.height, 9);
        assert_eq!(out.address, user);
        assert_eq!(out.balances[0].account_balance, "2.5");
        assert_eq!(out.balances[0].deposit_balance, "1.012345");
        assert_eq!(out.total_balance, "2.5");
        assert_eq!(out.total_deposit, "1.012345");
    }

    #[tokio::test]
    async fn test_balance_without_address() {
        let err = aggregator(MockLedger::new("columbus-4"), None)
            .balance(&[Currency::Ust], None)
            .await
            .unwrap_err();
        assert!(matches!(err, EarnError::AddressRequired));
    }

    #[tokio::test]
    async fn test_balance_unconfigured_market_fails_before_network() {
        let mock = MockLedger::new("columbus-4").unreachable();
        let err = aggregator(mock, Some(Address::new("terra1user")))
            .balance(&[Currency::Ust, Currency::Krw], None)
            .await
            .unwrap_err();
        assert!(matches!(err, EarnError::UnsupportedCurrency(_)));
    }

    #[tokio::test]
    async fn test_market_filters_unsupported() {
        let mock = MockLedger::new("columbus-4")
            .with_balance(&Address::new("terra1market"), "uusd", 7_000_000)
            .with_deposit_rate(&Address::new("terra1overseer"), dec("0.0000001"));
        let out = aggregator(mock, None)
            .market(&[Currency::Krw, Currency::Ust, Currency::Aust])
            .await
            .unwrap();
        assert_eq!(out.markets.len(), 1);
        assert_eq!(out.markets[0].currency, Currency::Ust);
        assert_eq!(out.markets[0].liquidity, "7");
        assert_eq!(out.markets[0].apy.to_canonical_string(), "0.4906443");
    }

    #[tokio::test]
    async fn test_market_out_of_range_deposit_rate_is_query_failed() {
        let mock = MockLedger::new("columbus-4")
            .with_balance(&Address::new("terra1market"), "uusd", 7_000_000)
            .with_deposit_rate(
                &Address::new("terra1overseer"),
                dec("79228162514264337593543950335"),
            );
        let err = aggregator(mock, None)
            .market(&[Currency::Ust])
            .await
            .unwrap_err();
        assert!(matches!(err, EarnError::QueryFailed(_)));
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_deposit_overflowing_rate_is_query_failed() {
        let user = Address::new("terra1user");
        let mock = MockLedger::new("columbus-4")
            .with_token_balance(&Address::new("terra1atoken"), &user, u64::MAX as u128)
            .with_exchange_rate(
                &Address::new("terra1market"),
                dec("79228162514264337593543950335"),
            );
        let err = aggregator(mock, Some(user))
            .balance(&[Currency::Ust], None)
            .await
            .unwrap_err();
        assert!(matches!(err, EarnError::QueryFailed(_)));
    }

    #[tokio::test]
    async fn test_balance_total_overflow_is_query_failed() {
        let user = Address::new("terra1user");
        let provider = AddressProvider::new()
            .with_market(Currency::Ust, ust())
            .with_market(
                Currency::Krw,
                MarketContracts {
                    market: Address::new("terra1krwmarket"),
                    a_token: Address::new("terra1krwatoken"),
                    overseer: Address::new("terra1krwoverseer"),
                },
            );
        let mock = MockLedger::new("columbus-4")
            .with_balance(&user, "uusd", u128::MAX)
            .with_balance(&user, "ukrw", 1)
            .with_exchange_rate(&Address::new("terra1market"), dec("1"))
            .with_exchange_rate(&Address::new("terra1krwmarket"), dec("1"))
            .with_swap_rate("ukrw", "uusd", dec("1"));
        let ledger: Arc<dyn LedgerRpc> = Arc::new(mock);
        let err = Aggregator::new(LedgerQuery::new(ledger, Arc::new(provider)), Some(user))
            .balance(&[Currency::Ust, Currency::Krw], None)
            .await
            .unwrap_err();
        assert!(matches!(err, EarnError::QueryFailed(_)));
    }

    #[test]
    fn test_market_entry_json_keys() {
        let entry = MarketEntry {
            currency: Currency::Ust,
            liquidity: "1".to_string(),
            apy: dec("0.2"),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"currency": "UST", "liquidity": "1", "APY": "0.2"})
        );
    }
}
