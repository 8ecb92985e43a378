use axum::{
    extract::{Path, Query},
    Json,
};
use freightdesk_domains::market::{IndexPoint, IndexSnapshot, MarketIndex};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
}

pub async fn list_indices(deps: AppState) -> ApiResult<Json<Vec<IndexSnapshot>>> {
    Ok(Json(MarketIndex::latest_snapshots(deps.pool()).await?))
}

pub async fn index_history(
    deps: AppState,
    Path(code): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<IndexPoint>>> {
    Ok(Json(MarketIndex::history(&code, query.days, deps.pool()).await?))
}
