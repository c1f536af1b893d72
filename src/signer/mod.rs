//! Signing capabilities consumed by the orchestrator.
//!
//! - [`KeySigner`]: the client's own key holder; signs and leaves broadcasting
//!   to the orchestrator.
//! - [`ExternalSigner`]: a caller-supplied callback; may hand back a signed
//!   transaction for the standard broadcast path or submit it itself.
//!
//! Key management and the signature scheme live behind these traits.

use crate::domain::{Address, Coin, Decimal};
use crate::ledger::BroadcastResult;
use crate::msg::Msg;
use crate::network::GasConfig;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

pub mod mock;

pub use mock::MockKeySigner;

/// Gas units requested when a signer has no simulation result.
pub const DEFAULT_GAS_WANTED: u64 = 200_000;

/// Fee attached to a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    #[serde(with = "gas_string")]
    pub gas: u64,
}

impl Fee {
    /// Fee for `gas_wanted` units scaled by the adjustment, paid in every
    /// denomination the gas config prices.
    pub fn estimate(gas: &GasConfig, gas_wanted: u64) -> Self {
        let limit = (Decimal::from(gas_wanted) * gas.gas_adjustment).inner().ceil();
        let amount = gas
            .gas_prices
            .iter()
            .filter_map(|(denom, price)| {
                let cost = (price.inner() * limit).ceil();
                cost.to_u128().map(|a| Coin::new(denom, a))
            })
            .collect();
        Self {
            amount,
            gas: limit.to_u64().unwrap_or(gas_wanted),
        }
    }
}

mod gas_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A signed, ready-to-broadcast transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub msg: Vec<Msg>,
    pub fee: Fee,
    pub signatures: Vec<String>,
    pub memo: String,
}

impl SignedTransaction {
    pub fn new(msg: Vec<Msg>, fee: Fee, signatures: Vec<String>, memo: impl Into<String>) -> Self {
        Self {
            msg,
            fee,
            signatures,
            memo: memo.into(),
        }
    }

    pub fn messages(&self) -> &[Msg] {
        &self.msg
    }

    /// Uppercase hex SHA-256 over the canonical JSON encoding.
    pub fn hash(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode_upper(Sha256::digest(&bytes)))
    }
}

#[derive(Debug, Clone, Error)]
pub enum SignerError {
    #[error("signing rejected: {0}")]
    Rejected(String),
    #[error("signer unavailable: {0}")]
    Unavailable(String),
    #[error("signer error: {0}")]
    Other(String),
}

/// The client's own key.
#[async_trait]
pub trait KeySigner: Send + Sync + fmt::Debug {
    /// Account address controlled by this key.
    fn address(&self) -> &Address;

    /// Sign `msgs`, choosing fees from `gas`.
    async fn sign(&self, msgs: &[Msg], gas: &GasConfig) -> Result<SignedTransaction, SignerError>;
}

/// What an external signer did with the messages it was handed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalSignature {
    /// Signed; the orchestrator broadcasts it.
    Signed(SignedTransaction),
    /// Signed and submitted by the caller; broadcasting is skipped.
    Submitted(BroadcastResult),
}

/// Caller-supplied signing callback.
///
/// Any `Fn(Vec<Msg>) -> impl Future<Output = Result<ExternalSignature, SignerError>>`
/// implements this trait.
#[async_trait]
pub trait ExternalSigner: Send + Sync {
    async fn sign(&self, msgs: Vec<Msg>) -> Result<ExternalSignature, SignerError>;
}

#[async_trait]
impl<F, Fut> ExternalSigner for F
where
    F: Fn(Vec<Msg>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ExternalSignature, SignerError>> + Send + 'static,
{
    async fn sign(&self, msgs: Vec<Msg>) -> Result<ExternalSignature, SignerError> {
        (self)(msgs).await
    }
}

/// Signing path chosen once per request.
#[derive(Clone)]
pub enum SigningMode {
    Local(Arc<dyn KeySigner>),
    External(Arc<dyn ExternalSigner>),
}

impl fmt::Debug for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningMode::Local(key) => write!(f, "Local({})", key.address()),
            SigningMode::External(_) => write!(f, "External"),
        }
    }
}

impl SigningMode {
    /// A caller-supplied signer wins over the client key.
    pub fn select(
        external: Option<Arc<dyn ExternalSigner>>,
        key: Option<&Arc<dyn KeySigner>>,
    ) -> Option<Self> {
        match (external, key) {
            (Some(external), _) => Some(SigningMode::External(external)),
            (None, Some(key)) => Some(SigningMode::Local(key.clone())),
            (None, None) => None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, SigningMode::External(_))
    }
}
