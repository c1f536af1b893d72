use super::ensure;
use super::output::{notify, OperationObserver, OperationOutcome, OutputNormalizer, TxType};
use super::request::{OperationOptions, OperationRequest, SendRequest};
use crate::domain::{div_floor, Address, Currency};
use crate::error::EarnError;
use crate::ledger::{BroadcastResult, LedgerQuery, LedgerRpc};
use crate::msg::{
    fabricate_cw20_transfer, fabricate_deposit_stable, fabricate_native_send,
    fabricate_redeem_stable, Msg,
};
use crate::network::GasConfig;
use crate::signer::{ExternalSignature, KeySigner, SignedTransaction, SigningMode};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs deposit, withdraw and send end to end:
/// preconditions, message build, signing, broadcast, classification.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    query: LedgerQuery,
    ledger: Arc<dyn LedgerRpc>,
    gas: GasConfig,
    key: Option<Arc<dyn KeySigner>>,
    address: Option<Address>,
    normalizer: OutputNormalizer,
}

impl Orchestrator {
    pub fn new(
        query: LedgerQuery,
        ledger: Arc<dyn LedgerRpc>,
        gas: GasConfig,
        key: Option<Arc<dyn KeySigner>>,
        address: Option<Address>,
    ) -> Self {
        let fee = gas.price_of(Currency::SETTLEMENT.denom());
        let normalizer = OutputNormalizer::new(query.chain_id(), fee);
        Self {
            query,
            ledger,
            gas,
            key,
            address,
            normalizer,
        }
    }

    /// The client's own account: signing key first, then the configured address.
    pub fn own_address(&self) -> Option<Address> {
        self.key
            .as_ref()
            .map(|key| key.address().clone())
            .or_else(|| self.address.clone())
    }

    /// Deposit a native stable into its market.
    pub async fn deposit(&self, request: OperationRequest) -> Result<OperationOutcome, EarnError> {
        let OperationRequest {
            currency,
            amount,
            options,
        } = request;
        info!("Deposit requested currency={} amount={}", currency, amount);

        let contracts = self.query.contracts().market(currency)?.clone();
        let micro = ensure::nonzero_micro(&amount)?;
        let (mode, sender) = self.signing(&options)?;
        ensure::native_balance(&self.query, &sender, currency, micro).await?;

        let msgs = fabricate_deposit_stable(&sender, &contracts, currency, micro);
        let result = self.submit(&mode, msgs).await?;
        Ok(self.finish(result, TxType::Deposit, None, options.observer))
    }

    /// Redeem receipt tokens.
    ///
    /// `aUST` amounts are receipt units. `UST` amounts are converted at the
    /// current exchange rate, rounding the receipt amount down.
    pub async fn withdraw(&self, request: OperationRequest) -> Result<OperationOutcome, EarnError> {
        let OperationRequest {
            currency,
            amount,
            options,
        } = request;
        info!("Withdraw requested currency={} amount={}", currency, amount);

        if !(currency.is_receipt() || currency.is_settlement()) {
            return Err(EarnError::UnsupportedCurrency(currency.to_string()));
        }
        let underlying = self.query.contracts().underlying(currency)?;
        let contracts = self.query.contracts().market(underlying)?.clone();
        let micro = ensure::nonzero_micro(&amount)?;
        let (mode, sender) = self.signing(&options)?;

        let (receipt_micro, requested_amount) = if currency.is_receipt() {
            (micro, "0".to_string())
        } else {
            let rate = self.query.exchange_rate(currency).await?;
            let receipt = div_floor(micro, rate).map_err(EarnError::malformed_response)?;
            debug!(
                "Withdraw conversion micro={} rate={} receipt={}",
                micro, rate, receipt
            );
            if receipt == 0 {
                return Err(EarnError::ZeroAmount);
            }
            (receipt, amount.clone())
        };

        let holder = self.own_address().unwrap_or_else(|| sender.clone());
        ensure::receipt_balance(&self.query, &holder, currency, receipt_micro).await?;

        let msgs = fabricate_redeem_stable(&sender, &contracts, receipt_micro);
        let result = self.submit(&mode, msgs).await?;
        Ok(self.finish(
            result,
            TxType::Withdraw,
            Some(requested_amount),
            options.observer,
        ))
    }

    /// Transfer UST natively or aUST through its token contract.
    pub async fn send(
        &self,
        currency: Currency,
        request: SendRequest,
    ) -> Result<OperationOutcome, EarnError> {
        let SendRequest {
            recipient,
            amount,
            options,
        } = request;
        info!(
            "Send requested currency={} amount={} recipient={}",
            currency, amount, recipient
        );

        if !(currency.is_receipt() || currency.is_settlement()) {
            return Err(EarnError::UnsupportedCurrency(currency.to_string()));
        }
        let micro = ensure::nonzero_micro(&amount)?;
        let (mode, sender) = self.signing(&options)?;

        let (msgs, kind) = if currency.is_receipt() {
            let token = self.query.contracts().receipt_token(currency)?.clone();
            ensure::receipt_balance(&self.query, &sender, currency, micro).await?;
            (
                fabricate_cw20_transfer(&sender, &token, &recipient, micro),
                TxType::SendAust,
            )
        } else {
            ensure::native_balance(&self.query, &sender, currency, micro).await?;
            (
                fabricate_native_send(&sender, &recipient, currency, micro),
                TxType::Send,
            )
        };

        let result = self.submit(&mode, msgs).await?;
        Ok(self.finish(result, kind, None, options.observer))
    }

    /// Pick the signing path and the paying account for one request.
    fn signing(&self, options: &OperationOptions) -> Result<(SigningMode, Address), EarnError> {
        if options.signer.is_some() && options.address.is_none() {
            return Err(EarnError::AddressRequired);
        }
        let mode = SigningMode::select(options.signer.clone(), self.key.as_ref())
            .ok_or(EarnError::SignerUnavailable)?;
        let sender = match (&options.address, &mode) {
            (Some(address), _) => address.clone(),
            (None, SigningMode::Local(key)) => key.address().clone(),
            (None, SigningMode::External(_)) => return Err(EarnError::AddressRequired),
        };
        Ok((mode, sender))
    }

    async fn submit(&self, mode: &SigningMode, msgs: Vec<Msg>) -> Result<BroadcastResult, EarnError> {
        match mode {
            SigningMode::Local(key) => {
                let tx = key.sign(&msgs, &self.gas).await?;
                self.broadcast(&tx).await
            }
            SigningMode::External(signer) => match signer.sign(msgs).await? {
                ExternalSignature::Signed(tx) => self.broadcast(&tx).await,
                ExternalSignature::Submitted(result) => {
                    debug!("External signer submitted the transaction itself");
                    Ok(result)
                }
            },
        }
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResult, EarnError> {
        debug!("Broadcasting {} message(s)", tx.messages().len());
        self.ledger
            .broadcast(tx)
            .await
            .map_err(EarnError::BroadcastFailed)
    }

    fn finish(
        &self,
        result: BroadcastResult,
        kind: TxType,
        requested_amount: Option<String>,
        observer: Option<Arc<dyn OperationObserver>>,
    ) -> OperationOutcome {
        let outcome = self.normalizer.classify(result, kind, requested_amount);
        match &outcome {
            OperationOutcome::Success(record) => info!(
                "{:?} succeeded tx_hash={}",
                kind,
                record.tx_hash().unwrap_or_default()
            ),
            OperationOutcome::Failure(err) => {
                warn!("{:?} failed on chain: {}", kind, err.error_msg)
            }
        }
        notify(observer, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Decimal;
    use crate::ledger::MockLedger;
    use crate::network::NetworkConfig;
    use crate::signer::{MockKeySigner, SignerError};

    fn orchestrator(mock: MockLedger, key: Option<Address>) -> Orchestrator {
        let network = NetworkConfig::mainnet();
        let ledger: Arc<dyn LedgerRpc> = Arc::new(mock);
        let query = LedgerQuery::new(ledger.clone(), Arc::new(network.contracts));
        let key = key.map(|a| Arc::new(MockKeySigner::new(a)) as Arc<dyn KeySigner>);
        Orchestrator::new(query, ledger, network.gas, key, None)
    }

    #[test]
    fn test_signing_requires_address_with_custom_signer() {
        let orch = orchestrator(MockLedger::new("columbus-4"), Some(Address::new("terra1me")));
        let signer: Arc<dyn crate::signer::ExternalSigner> = Arc::new(|_msgs: Vec<Msg>| async {
            Err::<ExternalSignature, _>(SignerError::Rejected("no".to_string()))
        });
        let options = OperationOptions {
            signer: Some(signer),
            ..Default::default()
        };
        assert!(matches!(
            orch.signing(&options),
            Err(EarnError::AddressRequired)
        ));
    }

    #[test]
    fn test_signing_without_any_signer() {
        let orch = orchestrator(MockLedger::new("columbus-4"), None);
        assert!(matches!(
            orch.signing(&OperationOptions::default()),
            Err(EarnError::SignerUnavailable)
        ));
    }

    #[test]
    fn test_signing_defaults_to_key_address() {
        let me = Address::new("terra1me");
        let orch = orchestrator(MockLedger::new("columbus-4"), Some(me.clone()));
        let (mode, sender) = orch.signing(&OperationOptions::default()).unwrap();
        assert!(!mode.is_external());
        assert_eq!(sender, me);
        assert_eq!(orch.own_address(), Some(me));
    }

    #[tokio::test]
    async fn test_withdraw_rejects_krw() {
        let orch = orchestrator(MockLedger::new("columbus-4"), Some(Address::new("terra1me")));
        let err = orch
            .withdraw(OperationRequest::new(Currency::Krw, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EarnError::UnsupportedCurrency(_)));
    }

    #[tokio::test]
    async fn test_withdraw_dust_rounds_to_zero_receipt() {
        let network = NetworkConfig::mainnet();
        let market = network.contracts.market(Currency::Ust).unwrap().market.clone();
        let mock = MockLedger::new("columbus-4")
            .with_exchange_rate(&market, Decimal::from_str_canonical("2").unwrap());
        let orch = orchestrator(mock, Some(Address::new("terra1me")));
        let err = orch
            .withdraw(OperationRequest::new(Currency::Ust, "0.000001"))
            .await
            .unwrap_err();
        assert!(matches!(err, EarnError::ZeroAmount));
    }
}
