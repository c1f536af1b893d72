use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{parse_currencies, AppState};
use crate::error::AppError;
use crate::orchestration::MarketOutput;

#[derive(Debug, Deserialize)]
pub struct MarketQuery {
    pub currencies: Option<String>,
}

pub async fn get_market(
    Query(params): Query<MarketQuery>,
    State(state): State<AppState>,
) -> Result<Json<MarketOutput>, AppError> {
    let currencies = parse_currencies(params.currencies.as_deref())?;
    let output = state.client.market(&currencies).await?;
    Ok(Json(output))
}
