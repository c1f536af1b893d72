//! `AnchorEarn`: the public entry point tying the ledger, signer and
//! network configuration together.

use crate::domain::{Address, Currency};
use crate::error::EarnError;
use crate::ledger::{LcdClient, LedgerQuery, LedgerRpc};
use crate::network::{AddressProvider, GasConfig, NetworkConfig};
use crate::orchestration::{
    Aggregator, BalanceOutput, MarketOutput, OperationOutcome, OperationRequest, Orchestrator,
    SendRequest,
};
use crate::signer::KeySigner;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Savings client bound to one network and, optionally, one account.
#[derive(Debug, Clone)]
pub struct AnchorEarn {
    network: NetworkConfig,
    orchestrator: Orchestrator,
    aggregator: Aggregator,
}

impl AnchorEarn {
    pub fn builder() -> AnchorEarnBuilder {
        AnchorEarnBuilder::default()
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn chain_id(&self) -> &str {
        &self.network.chain_id
    }

    /// Account used when a request names none.
    pub fn address(&self) -> Option<Address> {
        self.orchestrator.own_address()
    }

    pub async fn deposit(&self, request: OperationRequest) -> Result<OperationOutcome, EarnError> {
        self.orchestrator.deposit(request).await
    }

    pub async fn withdraw(&self, request: OperationRequest) -> Result<OperationOutcome, EarnError> {
        self.orchestrator.withdraw(request).await
    }

    pub async fn send(
        &self,
        currency: Currency,
        request: SendRequest,
    ) -> Result<OperationOutcome, EarnError> {
        self.orchestrator.send(currency, request).await
    }

    pub async fn balance(
        &self,
        currencies: &[Currency],
        address: Option<&Address>,
    ) -> Result<BalanceOutput, EarnError> {
        self.aggregator.balance(currencies, address).await
    }

    pub async fn market(&self, currencies: &[Currency]) -> Result<MarketOutput, EarnError> {
        self.aggregator.market(currencies).await
    }
}

/// Builder for [`AnchorEarn`].
///
/// Defaults to mainnet over its public LCD. Without a signing key the client
/// can still query, and can mutate through per-request custom signers.
#[derive(Debug, Default)]
pub struct AnchorEarnBuilder {
    network: Option<NetworkConfig>,
    ledger: Option<Arc<dyn LedgerRpc>>,
    gas: Option<GasConfig>,
    contracts: Option<AddressProvider>,
    key: Option<Arc<dyn KeySigner>>,
    address: Option<Address>,
    timeout: Option<Duration>,
}

impl AnchorEarnBuilder {
    pub fn network(mut self, network: NetworkConfig) -> Self {
        self.network = Some(network);
        self
    }

    /// Use this ledger instead of an LCD client for the network's URL.
    pub fn ledger(mut self, ledger: Arc<dyn LedgerRpc>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn gas(mut self, gas: GasConfig) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn contracts(mut self, contracts: AddressProvider) -> Self {
        self.contracts = Some(contracts);
        self
    }

    pub fn signing_key(mut self, key: Arc<dyn KeySigner>) -> Self {
        self.key = Some(key);
        self
    }

    /// Account queried and redeemed from when no signing key is set.
    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Per-call timeout of the LCD client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AnchorEarn, EarnError> {
        let mut network = self.network.unwrap_or_else(NetworkConfig::mainnet);
        if let Some(gas) = self.gas {
            network.gas = gas;
        }
        if let Some(contracts) = self.contracts {
            network.contracts = contracts;
        }

        let ledger: Arc<dyn LedgerRpc> = match self.ledger {
            Some(ledger) => ledger,
            None => Arc::new(LcdClient::new(
                network.lcd_url.clone(),
                network.chain_id.clone(),
                self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            )?),
        };
        network.chain_id = ledger.chain_id().to_string();

        let query_address = self
            .address
            .clone()
            .or_else(|| self.key.as_ref().map(|key| key.address().clone()));
        let query = LedgerQuery::new(ledger.clone(), Arc::new(network.contracts.clone()));
        let orchestrator = Orchestrator::new(
            query.clone(),
            ledger,
            network.gas.clone(),
            self.key,
            self.address,
        );
        let aggregator = Aggregator::new(query, query_address);

        Ok(AnchorEarn {
            network,
            orchestrator,
            aggregator,
        })
    }
}
