use axum::{extract::Query, http::StatusCode, Json};
use freightdesk_domains::news::{
    CategoryCount, NewNewsSource, NewsArticle, NewsCategory, NewsPipeline, NewsRunStats,
    NewsSource,
};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiResult;

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub category: Option<NewsCategory>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_news(
    deps: AppState,
    Query(query): Query<NewsQuery>,
) -> ApiResult<Json<Vec<NewsArticle>>> {
    let articles =
        NewsArticle::list(query.category, query.limit, query.offset, deps.pool()).await?;
    Ok(Json(articles))
}

pub async fn categories(deps: AppState) -> ApiResult<Json<Vec<CategoryCount>>> {
    Ok(Json(NewsArticle::category_counts(deps.pool()).await?))
}

pub async fn list_sources(deps: AppState) -> ApiResult<Json<Vec<NewsSource>>> {
    Ok(Json(NewsSource::list(deps.pool()).await?))
}

pub async fn create_source(
    deps: AppState,
    Json(input): Json<NewNewsSource>,
) -> ApiResult<(StatusCode, Json<NewsSource>)> {
    let source = NewsSource::create(&input, deps.pool()).await?;
    Ok((StatusCode::CREATED, Json(source)))
}

/// Run the news pipeline now instead of waiting for the next poll.
pub async fn refresh(deps: AppState) -> ApiResult<Json<NewsRunStats>> {
    let pipeline = NewsPipeline::from_deps(&deps)?;
    Ok(Json(pipeline.run(deps.pool()).await?))
}
