//! Terra LCD (REST) client implementation.

use super::{BroadcastResult, LedgerError, LedgerRpc};
use crate::domain::{Address, Coin};
use crate::signer::SignedTransaction;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Ledger RPC over a Terra LCD endpoint.
#[derive(Debug, Clone)]
pub struct LcdClient {
    client: Client,
    base_url: String,
    chain_id: String,
    max_elapsed: Duration,
}

impl LcdClient {
    /// Create a client whose every HTTP call is bounded by `timeout`.
    pub fn new(base_url: String, chain_id: String, timeout: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Other(format!("building http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            chain_id,
            max_elapsed: timeout.saturating_mul(2),
        })
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, LedgerError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(LedgerError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(LedgerError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(LedgerError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(LedgerError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(LedgerError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl LedgerRpc for LcdClient {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    async fn account_balance(&self, address: &Address) -> Result<Vec<Coin>, LedgerError> {
        debug!("Fetching bank balances for address={}", address);
        let response = self
            .get_json(&format!("/bank/balances/{}", address), &[])
            .await?;
        serde_json::from_value(lcd_result(response)?)
            .map_err(|e| LedgerError::ParseError(format!("Invalid balances: {}", e)))
    }

    async fn contract_query(
        &self,
        contract: &Address,
        query: &serde_json::Value,
    ) -> Result<serde_json::Value, LedgerError> {
        debug!("Querying contract={} msg={}", contract, query);
        let response = self
            .get_json(
                &format!("/wasm/contracts/{}/store", contract),
                &[("query_msg", query.to_string())],
            )
            .await?;
        lcd_result(response)
    }

    async fn block_height(&self) -> Result<u64, LedgerError> {
        debug!("Fetching latest block");
        let response = self.get_json("/blocks/latest", &[]).await?;
        response
            .pointer("/block/header/height")
            .and_then(json_u64)
            .ok_or_else(|| LedgerError::ParseError("Missing block height".to_string()))
    }

    async fn swap_rate(&self, offer: &Coin, ask_denom: &str) -> Result<Coin, LedgerError> {
        debug!("Fetching swap rate offer={} ask={}", offer, ask_denom);
        let response = self
            .get_json(
                "/market/swap",
                &[
                    ("offer_coin", offer.to_string()),
                    ("ask_denom", ask_denom.to_string()),
                ],
            )
            .await?;
        serde_json::from_value(lcd_result(response)?)
            .map_err(|e| LedgerError::ParseError(format!("Invalid swap coin: {}", e)))
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResult, LedgerError> {
        // Single attempt, never retried.
        let url = format!("{}/txs", self.base_url);
        let hash = tx
            .hash()
            .map_err(|e| LedgerError::Other(format!("Unencodable transaction: {}", e)))?;
        debug!("Broadcasting tx hash={}", hash);
        let body = serde_json::json!({ "tx": tx, "mode": "block" });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::NetworkError(e.to_string()))?;

        let status = response.status();
        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| LedgerError::ParseError(e.to_string()))?;

        if !status.is_success() && payload.get("txhash").is_none() {
            let message = payload
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("Broadcast rejected")
                .to_string();
            return Err(LedgerError::HttpError {
                status: status.as_u16(),
                message,
            });
        }

        parse_broadcast(&payload)
    }
}

/// Unwrap the `{"height": .., "result": ..}` envelope used by legacy LCD routes.
fn lcd_result(response: serde_json::Value) -> Result<serde_json::Value, LedgerError> {
    match response {
        serde_json::Value::Object(mut map) => map
            .remove("result")
            .ok_or_else(|| LedgerError::ParseError("Missing result field".to_string())),
        _ => Err(LedgerError::ParseError(
            "Expected object response".to_string(),
        )),
    }
}

/// Heights arrive as strings on some routes and numbers on others.
fn json_u64(value: &serde_json::Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn parse_broadcast(payload: &serde_json::Value) -> Result<BroadcastResult, LedgerError> {
    let tx_hash = payload
        .get("txhash")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let height = payload.get("height").and_then(json_u64);
    // Codes beyond u32 still mark a failure.
    let code = payload
        .get("code")
        .and_then(|v| v.as_u64())
        .map_or(0, |raw| u32::try_from(raw).unwrap_or(u32::MAX));
    let raw_log = payload
        .get("raw_log")
        .and_then(|v| v.as_str())
        .or_else(|| payload.get("error").and_then(|v| v.as_str()))
        .unwrap_or_default()
        .to_string();

    if code != 0 || payload.get("error").is_some() {
        warn!("Transaction failed on chain: code={} log={}", code, raw_log);
        return Ok(BroadcastResult::Failure {
            tx_hash,
            height,
            code,
            raw_log,
        });
    }

    match (tx_hash, height) {
        (Some(tx_hash), Some(height)) => Ok(BroadcastResult::Success {
            tx_hash,
            height,
            raw_log,
        }),
        _ => Err(LedgerError::ParseError(
            "Broadcast response missing txhash or height".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcd_result_unwraps_envelope() {
        let response = serde_json::json!({
            "height": "100",
            "result": [{"denom": "uusd", "amount": "42"}]
        });
        let coins: Vec<Coin> = serde_json::from_value(lcd_result(response).unwrap()).unwrap();
        assert_eq!(coins, vec![Coin::new("uusd", 42)]);
    }

    #[test]
    fn test_lcd_result_missing_result() {
        let err = lcd_result(serde_json::json!({"height": "1"})).unwrap_err();
        assert!(matches!(err, LedgerError::ParseError(_)));
    }

    #[test]
    fn test_parse_broadcast_success() {
        let payload = serde_json::json!({
            "height": "1234",
            "txhash": "ABCDEF",
            "raw_log": "[]",
            "logs": []
        });
        assert_eq!(
            parse_broadcast(&payload).unwrap(),
            BroadcastResult::Success {
                tx_hash: "ABCDEF".to_string(),
                height: 1234,
                raw_log: "[]".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_broadcast_execution_error() {
        let payload = serde_json::json!({
            "height": "1235",
            "txhash": "FEDCBA",
            "code": 3,
            "raw_log": "execute wasm contract failed: Cannot redeem zero"
        });
        match parse_broadcast(&payload).unwrap() {
            BroadcastResult::Failure {
                tx_hash,
                code,
                raw_log,
                ..
            } => {
                assert_eq!(tx_hash.as_deref(), Some("FEDCBA"));
                assert_eq!(code, 3);
                assert!(raw_log.contains("Cannot redeem zero"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_broadcast_oversized_code_stays_failure() {
        let payload = serde_json::json!({
            "txhash": "BIG",
            "height": "9",
            "code": 4_294_967_296u64,
            "raw_log": "out of gas",
        });
        match parse_broadcast(&payload).unwrap() {
            BroadcastResult::Failure { code, .. } => assert_eq!(code, u32::MAX),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_broadcast_missing_hash_is_parse_error() {
        let payload = serde_json::json!({"height": "5"});
        assert!(matches!(
            parse_broadcast(&payload),
            Err(LedgerError::ParseError(_))
        ));
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = LcdClient::new(
            "https://lcd.terra.dev/".to_string(),
            "columbus-4".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://lcd.terra.dev");
        assert_eq!(client.chain_id(), "columbus-4");
    }
}
