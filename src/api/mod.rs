pub mod balance;
pub mod health;
pub mod market;

use crate::client::AnchorEarn;
use crate::domain::Currency;
use crate::error::AppError;
use axum::{routing::get, Router};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<AnchorEarn>,
}

impl AppState {
    pub fn new(client: Arc<AnchorEarn>) -> Self {
        Self { client }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/balance", get(balance::get_balance))
        .route("/v1/market", get(market::get_market))
        .layer(cors)
        .with_state(state)
}

/// Parse a comma-separated currency list; absent or blank means UST only.
fn parse_currencies(raw: Option<&str>) -> Result<Vec<Currency>, AppError> {
    let currencies = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Currency::from_str(s).map_err(|e| AppError::BadRequest(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    if currencies.is_empty() {
        return Ok(vec![Currency::SETTLEMENT]);
    }
    Ok(currencies)
}
