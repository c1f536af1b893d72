use anchor_earn::domain::{Address, Currency};
use anchor_earn::ledger::{BroadcastResult, MockLedger};
use anchor_earn::msg::Msg;
use anchor_earn::network::{AddressProvider, MarketContracts, NetworkConfig};
use anchor_earn::orchestration::{
    ChannelObserver, ObserverError, OperationObserver, OperationOutcome, OperationRequest, TxType,
};
use anchor_earn::signer::{
    ExternalSignature, ExternalSigner, Fee, MockKeySigner, SignedTransaction, SignerError,
};
use anchor_earn::{AnchorEarn, EarnError};
use async_trait::async_trait;
use std::sync::Arc;

const USER: &str = "terra1user";

fn contracts() -> AddressProvider {
    AddressProvider::new().with_market(
        Currency::Ust,
        MarketContracts {
            market: Address::new("terra1market"),
            a_token: Address::new("terra1atoken"),
            overseer: Address::new("terra1overseer"),
        },
    )
}

fn client(mock: &MockLedger, key: Option<&str>) -> AnchorEarn {
    let mut builder = AnchorEarn::builder()
        .ledger(Arc::new(mock.clone()))
        .contracts(contracts());
    if let Some(key) = key {
        builder = builder.signing_key(Arc::new(MockKeySigner::new(Address::new(key))));
    }
    builder.build().unwrap()
}

fn funded(micro: u128) -> MockLedger {
    MockLedger::new("columbus-4")
        .with_height(100)
        .with_balance(&Address::new(USER), "uusd", micro)
}

#[tokio::test]
async fn test_deposit_broadcasts_deposit_stable() {
    let mock = funded(100_000_000);
    let outcome = client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Ust, "12.5"))
        .await
        .unwrap();

    let broadcasts = mock.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    let Msg::ExecuteContract {
        sender,
        contract,
        execute_msg,
        coins,
    } = &broadcasts[0].messages()[0]
    else {
        panic!("expected execute contract");
    };
    assert_eq!(sender.as_str(), USER);
    assert_eq!(contract.as_str(), "terra1market");
    assert_eq!(execute_msg, &serde_json::json!({"deposit_stable": {}}));
    assert_eq!(coins[0].amount, 12_500_000);
    assert_eq!(coins[0].denom, "uusd");

    let record = outcome.output().unwrap();
    assert_eq!(record.kind, TxType::Deposit);
    assert_eq!(record.network, "columbus-4");
    assert_eq!(record.tx_details[0].height, 100);
    assert_eq!(record.tx_hash(), Some(broadcasts[0].hash().unwrap().as_str()));
    assert_eq!(
        record.tx_fee,
        NetworkConfig::mainnet().gas.price_of("uusd")
    );
    assert!(record.requested_amount.is_none());
}

#[tokio::test]
async fn test_deposit_zero_fails_regardless_of_balance() {
    let mock = funded(u64::MAX as u128);
    let err = client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Ust, "0"))
        .await
        .unwrap_err();
    assert!(matches!(err, EarnError::ZeroAmount));
    assert!(mock.broadcasts().is_empty());
}

#[tokio::test]
async fn test_deposit_invalid_amount() {
    let mock = funded(1);
    let err = client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Ust, "1,000"))
        .await
        .unwrap_err();
    assert!(matches!(err, EarnError::InvalidAmount(_)));
}

#[tokio::test]
async fn test_deposit_exceeding_balance_is_not_broadcast() {
    let mock = funded(5_000_000);
    let err = client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Ust, "5.000001"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EarnError::InsufficientBalance {
            requested: 5_000_001,
            available: 5_000_000,
            ..
        }
    ));
    assert!(mock.broadcasts().is_empty());
}

#[tokio::test]
async fn test_deposit_into_receipt_currency_is_unsupported() {
    let mock = funded(5_000_000);
    let err = client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Aust, "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EarnError::UnsupportedCurrency(_)));
}

#[tokio::test]
async fn test_deposit_without_signer() {
    let mock = funded(5_000_000);
    let err = client(&mock, None)
        .deposit(OperationRequest::new(Currency::Ust, "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EarnError::SignerUnavailable));
}

#[tokio::test]
async fn test_custom_signer_requires_address_before_network() {
    let mock = MockLedger::new("columbus-4").unreachable();
    let signer: Arc<dyn ExternalSigner> = Arc::new(|_msgs: Vec<Msg>| async {
        Err::<ExternalSignature, _>(SignerError::Rejected("unused".to_string()))
    });
    let err = client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Ust, "1").with_signer(signer))
        .await
        .unwrap_err();
    assert!(matches!(err, EarnError::AddressRequired));
}

#[tokio::test]
async fn test_custom_signer_submission_skips_broadcast() {
    let mock = funded(5_000_000);
    let signer: Arc<dyn ExternalSigner> = Arc::new(|_msgs: Vec<Msg>| async {
        Ok::<_, SignerError>(ExternalSignature::Submitted(BroadcastResult::Success {
            tx_hash: "WALLET".to_string(),
            height: 55,
            raw_log: "[]".to_string(),
        }))
    });
    let outcome = client(&mock, None)
        .deposit(
            OperationRequest::new(Currency::Ust, "1")
                .with_address(Address::new(USER))
                .with_signer(signer),
        )
        .await
        .unwrap();

    assert!(mock.broadcasts().is_empty());
    let record = outcome.output().unwrap();
    assert_eq!(record.tx_hash(), Some("WALLET"));
    assert_eq!(record.tx_details[0].height, 55);
}

#[tokio::test]
async fn test_custom_signer_signed_tx_is_broadcast() {
    let mock = funded(5_000_000);
    let gas = NetworkConfig::mainnet().gas;
    let signer: Arc<dyn ExternalSigner> = Arc::new(move |msgs: Vec<Msg>| {
        let fee = Fee::estimate(&gas, 150_000);
        async move {
            Ok::<_, SignerError>(ExternalSignature::Signed(SignedTransaction::new(
                msgs,
                fee,
                vec!["wallet-signature".to_string()],
                "",
            )))
        }
    });
    client(&mock, None)
        .deposit(
            OperationRequest::new(Currency::Ust, "2")
                .with_address(Address::new(USER))
                .with_signer(signer),
        )
        .await
        .unwrap();

    let broadcasts = mock.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].signatures, vec!["wallet-signature".to_string()]);
}

#[tokio::test]
async fn test_custom_signer_error_is_signing_failure() {
    let mock = funded(5_000_000);
    let signer: Arc<dyn ExternalSigner> = Arc::new(|_msgs: Vec<Msg>| async {
        Err::<ExternalSignature, _>(SignerError::Rejected("user cancelled".to_string()))
    });
    let err = client(&mock, None)
        .deposit(
            OperationRequest::new(Currency::Ust, "1")
                .with_address(Address::new(USER))
                .with_signer(signer),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EarnError::SigningFailed(_)));
    assert!(mock.broadcasts().is_empty());
}

#[tokio::test]
async fn test_chain_error_reaches_observer_once() {
    let mock = funded(5_000_000).with_broadcast_result(BroadcastResult::Failure {
        tx_hash: Some("FAILED".to_string()),
        height: Some(100),
        code: 11,
        raw_log: "out of gas in location: WriteFlat".to_string(),
    });
    let (observer, mut rx) = ChannelObserver::channel();
    let outcome = client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Ust, "1").with_observer(Arc::new(observer)))
        .await
        .unwrap();

    let err = outcome.error().unwrap();
    assert_eq!(err.kind, TxType::Deposit);
    assert_eq!(err.error_msg, "out of gas in location: WriteFlat");

    assert_eq!(rx.recv().await, Some(outcome));
    assert!(rx.recv().await.is_none());
}

struct FailingObserver;

#[async_trait]
impl OperationObserver for FailingObserver {
    async fn observe(&self, _outcome: OperationOutcome) -> Result<(), ObserverError> {
        Err("observer down".into())
    }
}

#[tokio::test]
async fn test_observer_failure_does_not_affect_result() {
    let mock = funded(5_000_000);
    let outcome = client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Ust, "1").with_observer(Arc::new(FailingObserver)))
        .await
        .unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_unreachable_node_is_query_failure() {
    let mock = MockLedger::new("columbus-4").unreachable();
    let err = client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Ust, "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EarnError::QueryFailed(_)));
}

#[tokio::test]
async fn test_deposit_rounds_sub_micro_amounts() {
    let mock = funded(2);
    client(&mock, Some(USER))
        .deposit(OperationRequest::new(Currency::Ust, "0.0000015"))
        .await
        .unwrap();
    let broadcasts = mock.broadcasts();
    let Msg::ExecuteContract { coins, .. } = &broadcasts[0].messages()[0] else {
        panic!("expected execute contract");
    };
    assert_eq!(coins[0].amount, 2);
}
