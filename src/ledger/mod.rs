//! Ledger RPC abstraction: balances, contract state, swap rates, broadcast.

use crate::domain::{Address, Coin};
use crate::signer::SignedTransaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod lcd;
pub mod mock;
pub mod query;

pub use lcd::LcdClient;
pub use mock::MockLedger;
pub use query::LedgerQuery;

/// Node access used by the client.
///
/// Implementations own transport concerns: retries, backoff and per-call
/// timeouts. Callers issue each method at most once per logical read.
#[async_trait]
pub trait LedgerRpc: Send + Sync + fmt::Debug {
    /// Chain identifier of the network this client talks to.
    fn chain_id(&self) -> &str;

    /// All native bank balances held by `address`.
    async fn account_balance(&self, address: &Address) -> Result<Vec<Coin>, LedgerError>;

    /// Smart query against a contract's state.
    async fn contract_query(
        &self,
        contract: &Address,
        query: &serde_json::Value,
    ) -> Result<serde_json::Value, LedgerError>;

    /// Height of the latest block.
    async fn block_height(&self) -> Result<u64, LedgerError>;

    /// Amount of `ask_denom` the market would return for `offer`.
    async fn swap_rate(&self, offer: &Coin, ask_denom: &str) -> Result<Coin, LedgerError>;

    /// Submit a signed transaction and wait for it to be included in a block.
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResult, LedgerError>;
}

/// Outcome of a transaction that reached the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BroadcastResult {
    Success {
        tx_hash: String,
        height: u64,
        raw_log: String,
    },
    /// Rejected by the chain (execution error, out of gas, ...).
    Failure {
        tx_hash: Option<String>,
        height: Option<u64>,
        code: u32,
        raw_log: String,
    },
}

/// Error type for ledger RPC operations.
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LedgerError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            LedgerError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            LedgerError::RateLimited => write!(f, "Rate limited"),
            LedgerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_display() {
        let err = LedgerError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = LedgerError::HttpError {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = LedgerError::ParseError("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid JSON");

        let err = LedgerError::RateLimited;
        assert_eq!(err.to_string(), "Rate limited");
    }

    #[test]
    fn test_broadcast_result_serialization() {
        let result = BroadcastResult::Failure {
            tx_hash: None,
            height: None,
            code: 5,
            raw_log: "insufficient funds".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["code"], 5);
    }
}
