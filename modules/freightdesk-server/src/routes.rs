use axum::{
    routing::{get, post, put},
    Router,
};
use freightdesk_core::ServerDeps;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, assistant, contracts, directory, market, news, rfqs};

pub fn build_router(deps: Arc<ServerDeps>) -> Router {
    let allowed_origins = deps.file_config.server.allowed_origins.clone();

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api = Router::new()
        // Directory
        .route(
            "/companies",
            get(directory::list_companies).post(directory::create_company),
        )
        .route(
            "/companies/{id}",
            get(directory::get_company)
                .put(directory::update_company)
                .delete(directory::delete_company),
        )
        .route("/companies/{id}/verify", post(directory::verify_company))
        .route("/companies/{id}/rating", put(directory::rate_company))
        .route("/companies/{id}/products", get(directory::company_products))
        .route(
            "/products",
            get(directory::list_products).post(directory::create_product),
        )
        .route(
            "/products/{id}",
            get(directory::get_product).put(directory::update_product),
        )
        .route("/products/{id}/deactivate", post(directory::deactivate_product))
        // RFQs and bidding
        .route("/rfqs", get(rfqs::list_rfqs).post(rfqs::create_rfq))
        .route("/rfqs/{id}", get(rfqs::get_rfq))
        .route("/rfqs/{id}/publish", post(rfqs::publish_rfq))
        .route("/rfqs/{id}/close", post(rfqs::close_rfq))
        .route("/rfqs/{id}/cancel", post(rfqs::cancel_rfq))
        .route("/rfqs/{id}/bids", get(rfqs::list_bids).post(rfqs::submit_bid))
        .route("/rfqs/{id}/comparison", get(rfqs::compare_quotations))
        .route("/rfqs/{id}/award", post(rfqs::award))
        .route("/bids/{id}/withdraw", post(rfqs::withdraw_bid))
        // Contracts and shipments
        .route("/contracts", get(contracts::list_contracts))
        .route("/contracts/{id}", get(contracts::get_contract))
        .route("/contracts/{id}/complete", post(contracts::complete_contract))
        .route("/contracts/{id}/cancel", post(contracts::cancel_contract))
        .route(
            "/contracts/{id}/shipments",
            get(contracts::list_shipments).post(contracts::create_shipment),
        )
        .route("/shipments/{id}", get(contracts::get_shipment))
        .route(
            "/shipments/track/{tracking_number}",
            get(contracts::track_shipment),
        )
        .route(
            "/shipments/{id}/events",
            get(contracts::shipment_events).post(contracts::record_event),
        )
        // Market
        .route("/market/indices", get(market::list_indices))
        .route("/market/indices/{code}/history", get(market::index_history))
        // News
        .route("/news", get(news::list_news))
        .route("/news/categories", get(news::categories))
        .route(
            "/news/sources",
            get(news::list_sources).post(news::create_source),
        )
        .route("/news/refresh", post(news::refresh))
        // Assistant
        .route("/assistant/sessions", post(assistant::create_session))
        .route(
            "/assistant/sessions/{id}/messages",
            get(assistant::list_messages).post(assistant::post_message),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(deps)
}
