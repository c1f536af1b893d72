use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

use super::{parse_currencies, AppState};
use crate::domain::Address;
use crate::error::AppError;
use crate::orchestration::BalanceOutput;

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub currencies: Option<String>,
    pub address: Option<String>,
}

pub async fn get_balance(
    Query(params): Query<BalanceQuery>,
    State(state): State<AppState>,
) -> Result<Json<BalanceOutput>, AppError> {
    let currencies = parse_currencies(params.currencies.as_deref())?;
    let address = match params.address.as_deref() {
        Some("") | None => None,
        Some(raw) => Some(
            Address::from_str(raw)
                .map_err(|_| AppError::BadRequest("Invalid address".into()))?,
        ),
    };

    let output = state
        .client
        .balance(&currencies, address.as_ref())
        .await?;
    Ok(Json(output))
}
