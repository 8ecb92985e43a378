use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use freightdesk_core::{file_config::parse_config, AppConfig, ServerDeps};
use freightdesk_server::routes::build_router;
use serde_json::Value;
use tower::ServiceExt;

const CONFIG: &str = r#"
[identity]
platform_name = "FreightDesk"
description = "test"

[server]
port = 0

[models]
assistant = "test-model"
news_classifier = "test-model"

[news]
confidence_threshold = 0.6
ai_batch_size = 10
poll_interval_minutes = 30
near_duplicate_threshold = 0.8
lookback_hours = 72
max_items_per_feed = 10
max_age_days = 7

[market]
poll_interval_minutes = 60

[rfq]
expiry_check_interval_minutes = 5

[comparison]
price_weight = 0.5
transit_weight = 0.25
rating_weight = 0.15
validity_weight = 0.1

[comparison.fx_to_usd]
USD = 1.0

[assistant]
history_window = 10
max_tokens = 256
system_prompt = "You help {{platform_name}} users."
"#;

/// Router over a pool that never connects; only routes that fail before
/// touching the database are exercised here.
fn app() -> Router {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://freightdesk@127.0.0.1:1/unused")
        .unwrap();
    let config = AppConfig {
        database_url: "postgres://freightdesk@127.0.0.1:1/unused".into(),
        anthropic_api_key: None,
        market_feed_api_key: None,
    };
    let deps = ServerDeps::new(
        pool,
        reqwest::Client::new(),
        None,
        config,
        Arc::new(parse_config(CONFIG).unwrap()),
    );
    build_router(Arc::new(deps))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn assistant_without_api_key_is_unavailable() {
    let request = Request::post(
        "/api/assistant/sessions/7f9c2a44-3e1b-4c7e-9a0d-5b6f1e2d3c4b/messages",
    )
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(r#"{"content":"What is the cheapest lane to Rotterdam?"}"#))
    .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAVAILABLE");
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let response = app()
        .oneshot(Request::get("/api/rfqs/not-a-uuid").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contract_listing_requires_company() {
    let response = app()
        .oneshot(Request::get("/api/contracts").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let response = app()
        .oneshot(Request::get("/api/warehouses").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
