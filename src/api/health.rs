use axum::extract::State;
use axum::Json;

use super::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Reports the network the service queries.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ready",
        "network": state.client.chain_id(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AnchorEarn;
    use crate::ledger::MockLedger;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready_reports_network() {
        let client = AnchorEarn::builder()
            .ledger(Arc::new(MockLedger::new("tequila-0004")))
            .build()
            .unwrap();
        let Json(body) = ready(State(AppState::new(Arc::new(client)))).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["network"], "tequila-0004");
    }
}
