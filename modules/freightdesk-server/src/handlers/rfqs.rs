use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use freightdesk_domains::bidding::{award_bid, Bid, BidWithBidder, NewBid};
use freightdesk_domains::contracts::Contract;
use freightdesk_domains::quotations::QuotationComparison;
use freightdesk_domains::rfqs::{NewRfq, Rfq, RfqFilters};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct AwardBody {
    pub bid_id: Uuid,
}

pub async fn list_rfqs(deps: AppState, Query(filters): Query<RfqFilters>) -> ApiResult<Json<Vec<Rfq>>> {
    Ok(Json(Rfq::list(&filters, deps.pool()).await?))
}

pub async fn create_rfq(
    deps: AppState,
    Json(input): Json<NewRfq>,
) -> ApiResult<(StatusCode, Json<Rfq>)> {
    let rfq = Rfq::create(&input, deps.pool()).await?;
    Ok((StatusCode::CREATED, Json(rfq)))
}

pub async fn get_rfq(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Rfq>> {
    Ok(Json(Rfq::find_by_id(id, deps.pool()).await?))
}

pub async fn publish_rfq(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Rfq>> {
    Ok(Json(Rfq::publish(id, deps.pool()).await?))
}

pub async fn close_rfq(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Rfq>> {
    Ok(Json(Rfq::close(id, deps.pool()).await?))
}

pub async fn cancel_rfq(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Rfq>> {
    Ok(Json(Rfq::cancel(id, deps.pool()).await?))
}

pub async fn list_bids(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Vec<BidWithBidder>>> {
    Rfq::find_by_id(id, deps.pool()).await?;
    Ok(Json(Bid::list_for_rfq(id, deps.pool()).await?))
}

pub async fn submit_bid(
    deps: AppState,
    Path(id): Path<Uuid>,
    Json(input): Json<NewBid>,
) -> ApiResult<(StatusCode, Json<Bid>)> {
    let bid = Bid::submit(id, &input, deps.pool()).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

pub async fn compare_quotations(
    deps: AppState,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QuotationComparison>> {
    let comparison =
        QuotationComparison::for_rfq(id, &deps.file_config.comparison, deps.pool()).await?;
    Ok(Json(comparison))
}

pub async fn award(
    deps: AppState,
    Path(id): Path<Uuid>,
    Json(body): Json<AwardBody>,
) -> ApiResult<(StatusCode, Json<Contract>)> {
    let contract = award_bid(id, body.bid_id, deps.pool()).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn withdraw_bid(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Bid>> {
    Ok(Json(Bid::withdraw(id, deps.pool()).await?))
}
