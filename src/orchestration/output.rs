//! Normalized operation results and observer notification.

use crate::domain::Decimal;
use crate::ledger::BroadcastResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Ledger family the client operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Terra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Deposit,
    Withdraw,
    Send,
    /// Transfer of receipt tokens.
    #[serde(rename = "sendaust")]
    SendAust,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Successful,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDetails {
    pub chain: Chain,
    pub height: u64,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
}

/// A transaction the chain accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    #[serde(rename = "type")]
    pub kind: TxType,
    pub chain: Chain,
    /// Chain id of the network.
    pub network: String,
    pub status: TxStatus,
    pub tx_details: Vec<TxDetails>,
    /// Gas price in the settlement denomination.
    pub tx_fee: Decimal,
    /// Withdrawals only: the amount as the caller asked for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_amount: Option<String>,
}

impl OutputRecord {
    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_details.first().map(|d| d.tx_hash.as_str())
    }
}

/// A transaction the chain rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(rename = "type")]
    pub kind: TxType,
    pub chain: Chain,
    pub error_msg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationOutcome {
    Success(OutputRecord),
    Failure(OperationError),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success(_))
    }

    pub fn output(&self) -> Option<&OutputRecord> {
        match self {
            OperationOutcome::Success(record) => Some(record),
            OperationOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&OperationError> {
        match self {
            OperationOutcome::Success(_) => None,
            OperationOutcome::Failure(err) => Some(err),
        }
    }
}

/// Turns broadcast results into [`OperationOutcome`]s for one network.
#[derive(Debug, Clone)]
pub struct OutputNormalizer {
    chain_id: String,
    fee: Decimal,
}

impl OutputNormalizer {
    pub fn new(chain_id: impl Into<String>, fee: Decimal) -> Self {
        Self {
            chain_id: chain_id.into(),
            fee,
        }
    }

    pub fn classify(
        &self,
        result: BroadcastResult,
        kind: TxType,
        requested_amount: Option<String>,
    ) -> OperationOutcome {
        match result {
            BroadcastResult::Success {
                tx_hash, height, ..
            } => OperationOutcome::Success(OutputRecord {
                kind,
                chain: Chain::Terra,
                network: self.chain_id.clone(),
                status: TxStatus::Successful,
                tx_details: vec![TxDetails {
                    chain: Chain::Terra,
                    height,
                    timestamp: Utc::now(),
                    tx_hash,
                }],
                tx_fee: self.fee,
                requested_amount,
            }),
            BroadcastResult::Failure { raw_log, .. } => {
                OperationOutcome::Failure(OperationError {
                    kind,
                    chain: Chain::Terra,
                    error_msg: raw_log,
                })
            }
        }
    }
}

pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every outcome produced for a request that supplied it.
#[async_trait]
pub trait OperationObserver: Send + Sync {
    async fn observe(&self, outcome: OperationOutcome) -> Result<(), ObserverError>;
}

/// Forwards outcomes into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<OperationOutcome>,
}

impl ChannelObserver {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OperationOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl OperationObserver for ChannelObserver {
    async fn observe(&self, outcome: OperationOutcome) -> Result<(), ObserverError> {
        self.tx.send(outcome).map_err(|e| e.to_string().into())
    }
}

/// Hand `outcome` to `observer` on a detached task.
///
/// Failures and panics inside the observer stay on that task. Outside a
/// tokio runtime the observer is skipped.
pub fn notify(observer: Option<Arc<dyn OperationObserver>>, outcome: &OperationOutcome) {
    let Some(observer) = observer else {
        return;
    };
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        warn!("No tokio runtime, operation observer not notified");
        return;
    };
    let outcome = outcome.clone();
    handle.spawn(async move {
        if let Err(e) = observer.observe(outcome).await {
            warn!("Operation observer failed: {}", e);
        }
    });
}
