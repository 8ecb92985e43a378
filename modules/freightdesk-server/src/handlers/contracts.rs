use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use freightdesk_domains::contracts::Contract;
use freightdesk_domains::shipments::{NewShipment, NewTrackingEvent, Shipment, TrackingEvent};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct ContractQuery {
    pub company_id: Uuid,
}

pub async fn list_contracts(
    deps: AppState,
    Query(query): Query<ContractQuery>,
) -> ApiResult<Json<Vec<Contract>>> {
    Ok(Json(Contract::list_for_company(query.company_id, deps.pool()).await?))
}

pub async fn get_contract(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Contract>> {
    Ok(Json(Contract::find_by_id(id, deps.pool()).await?))
}

pub async fn complete_contract(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Contract>> {
    Ok(Json(Contract::complete(id, deps.pool()).await?))
}

pub async fn cancel_contract(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Contract>> {
    Ok(Json(Contract::cancel(id, deps.pool()).await?))
}

pub async fn list_shipments(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Vec<Shipment>>> {
    Contract::find_by_id(id, deps.pool()).await?;
    Ok(Json(Shipment::list_for_contract(id, deps.pool()).await?))
}

pub async fn create_shipment(
    deps: AppState,
    Path(id): Path<Uuid>,
    Json(input): Json<NewShipment>,
) -> ApiResult<(StatusCode, Json<Shipment>)> {
    let shipment = Shipment::create(id, &input, deps.pool()).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

pub async fn get_shipment(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Shipment>> {
    Ok(Json(Shipment::find_by_id(id, deps.pool()).await?))
}

pub async fn track_shipment(
    deps: AppState,
    Path(tracking_number): Path<String>,
) -> ApiResult<Json<Shipment>> {
    Ok(Json(Shipment::find_by_tracking_number(&tracking_number, deps.pool()).await?))
}

pub async fn shipment_events(
    deps: AppState,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<TrackingEvent>>> {
    Ok(Json(Shipment::events(id, deps.pool()).await?))
}

pub async fn record_event(
    deps: AppState,
    Path(id): Path<Uuid>,
    Json(input): Json<NewTrackingEvent>,
) -> ApiResult<(StatusCode, Json<TrackingEvent>)> {
    let event = Shipment::record_event(id, &input, deps.pool()).await?;
    Ok((StatusCode::CREATED, Json(event)))
}
