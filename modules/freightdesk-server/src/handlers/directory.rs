use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use freightdesk_domains::directory::{
    Company, CompanyFilters, CompanyUpdate, NewCompany, NewProduct, Product, ProductFilters,
    ProductUpdate,
};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct RatingBody {
    pub rating: f32,
}

pub async fn list_companies(
    deps: AppState,
    Query(filters): Query<CompanyFilters>,
) -> ApiResult<Json<Vec<Company>>> {
    Ok(Json(Company::list(&filters, deps.pool()).await?))
}

pub async fn create_company(
    deps: AppState,
    Json(input): Json<NewCompany>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    let company = Company::create(&input, deps.pool()).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn get_company(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Company>> {
    Ok(Json(Company::find_by_id(id, deps.pool()).await?))
}

pub async fn update_company(
    deps: AppState,
    Path(id): Path<Uuid>,
    Json(changes): Json<CompanyUpdate>,
) -> ApiResult<Json<Company>> {
    Ok(Json(Company::update(id, &changes, deps.pool()).await?))
}

pub async fn delete_company(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    Company::delete(id, deps.pool()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn verify_company(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Company>> {
    Ok(Json(Company::verify(id, deps.pool()).await?))
}

pub async fn rate_company(
    deps: AppState,
    Path(id): Path<Uuid>,
    Json(body): Json<RatingBody>,
) -> ApiResult<Json<Company>> {
    Ok(Json(Company::set_rating(id, body.rating, deps.pool()).await?))
}

pub async fn company_products(
    deps: AppState,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<ProductFilters>,
) -> ApiResult<Json<Vec<Product>>> {
    Company::find_by_id(id, deps.pool()).await?;
    filters.company_id = Some(id);
    Ok(Json(Product::list(&filters, deps.pool()).await?))
}

pub async fn list_products(
    deps: AppState,
    Query(filters): Query<ProductFilters>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(Product::list(&filters, deps.pool()).await?))
}

pub async fn create_product(
    deps: AppState,
    Json(input): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = Product::create(&input, deps.pool()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Product>> {
    Ok(Json(Product::find_by_id(id, deps.pool()).await?))
}

pub async fn update_product(
    deps: AppState,
    Path(id): Path<Uuid>,
    Json(changes): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    Ok(Json(Product::update(id, &changes, deps.pool()).await?))
}

pub async fn deactivate_product(deps: AppState, Path(id): Path<Uuid>) -> ApiResult<Json<Product>> {
    Ok(Json(Product::deactivate(id, deps.pool()).await?))
}
