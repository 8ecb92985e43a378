//! Integration test: directory, market indices, news pipeline and assistant
//! against a real Postgres, with in-memory collectors and chat model.
//! Run with: cargo test -p freightdesk-domains --features test-utils --test services_test

#![cfg(feature = "test-utils")]

use std::sync::{Arc, Mutex};

use ai_client::{ChatAgent, Message, MessageRole};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use freightdesk_core::file_config::{AssistantConfig, IdentityConfig};
use freightdesk_core::{CompanyType, DomainError, ServiceMode};
use freightdesk_domains::assistant::{send_message, ChatMessage, ChatSession};
use freightdesk_domains::directory::{
    Company, CompanyFilters, CompanyUpdate, NewCompany, NewProduct, Product, ProductFilters,
};
use freightdesk_domains::market::{poll_market, IndexFeed, IndexQuote, MarketIndex};
use freightdesk_domains::news::analyzer::{NewsAnalyzer, RuleClassifier};
use freightdesk_domains::news::{
    NewNewsSource, NewsArticle, NewsCategory, NewsCollector, NewsPipeline, NewsSource, RawArticle,
};
use freightdesk_domains::testutil::postgres_container;

fn code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<DomainError>()
        .map(DomainError::code)
        .unwrap_or("OTHER")
}

fn new_company(name: &str, kind: CompanyType, country: &str) -> NewCompany {
    NewCompany {
        name: name.into(),
        company_type: kind,
        country: Some(country.into()),
        city: None,
        description: Some(format!("{name} moves freight")),
        website: None,
        email: None,
        phone: None,
    }
}

#[tokio::test]
async fn directory_crud_and_filters() {
    let (_container, pool) = postgres_container().await;

    let carrier = Company::create(&new_company("  Baltic Line ", CompanyType::Carrier, "EE"), &pool)
        .await
        .unwrap();
    assert_eq!(carrier.name, "Baltic Line");
    Company::create(&new_company("Iberia Cargo", CompanyType::Forwarder, "ES"), &pool)
        .await
        .unwrap();

    let verified = Company::verify(carrier.id, &pool).await.unwrap();
    assert!(verified.verified);
    let rated = Company::set_rating(carrier.id, 4.5, &pool).await.unwrap();
    assert_eq!(rated.rating, Some(4.5));
    let err = Company::set_rating(carrier.id, 7.0, &pool).await.unwrap_err();
    assert_eq!(code(&err), "VALIDATION");

    let updated = Company::update(
        carrier.id,
        &CompanyUpdate {
            city: Some("Tallinn".into()),
            ..Default::default()
        },
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(updated.city.as_deref(), Some("Tallinn"));
    assert_eq!(updated.name, "Baltic Line");

    let carriers = Company::list(
        &CompanyFilters {
            company_type: Some(CompanyType::Carrier),
            ..Default::default()
        },
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(carriers.len(), 1);

    let search = Company::list(
        &CompanyFilters {
            q: Some("iberia".into()),
            ..Default::default()
        },
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].country.as_deref(), Some("ES"));

    let product = Product::create(
        &NewProduct {
            company_id: carrier.id,
            name: "Weekly Tallinn–Helsinki RoRo".into(),
            service_mode: ServiceMode::RoadFtl,
            origin: Some("Tallinn".into()),
            destination: Some("Helsinki".into()),
            transit_days: Some(1),
            base_price: Some(650.0),
            currency: None,
            description: None,
        },
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(product.currency, "USD");

    let listed = Product::list(
        &ProductFilters {
            company_id: Some(carrier.id),
            ..Default::default()
        },
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(listed.len(), 1);

    Product::deactivate(product.id, &pool).await.unwrap();
    let listed = Product::list(
        &ProductFilters {
            company_id: Some(carrier.id),
            ..Default::default()
        },
        &pool,
    )
    .await
    .unwrap();
    assert!(listed.is_empty());

    Company::delete(carrier.id, &pool).await.unwrap();
    let err = Company::find_by_id(carrier.id, &pool).await.unwrap_err();
    assert_eq!(code(&err), "NOT_FOUND");
}

struct FixedFeed(Vec<IndexQuote>);

#[async_trait]
impl IndexFeed for FixedFeed {
    async fn fetch(&self) -> Result<Vec<IndexQuote>> {
        Ok(self.0.clone())
    }
}

fn quote(code: &str, days_ago: i64, value: f64) -> IndexQuote {
    IndexQuote {
        code: code.into(),
        name: Some(format!("{code} Composite")),
        unit: Some("USD/FEU".into()),
        date: Utc::now().date_naive() - Duration::days(days_ago),
        value,
    }
}

#[tokio::test]
async fn market_poll_snapshots_and_history() {
    let (_container, pool) = postgres_container().await;

    let feed = FixedFeed(vec![
        quote("wci", 7, 2000.0),
        quote("WCI", 0, 2200.0),
        quote("SCFI", 0, 1400.0),
        quote("BAD", 0, f64::NAN),
    ]);
    let stats = poll_market(&feed, &pool).await.unwrap();
    assert_eq!(stats.recorded, 3);
    assert_eq!(stats.skipped, 1);

    // Re-polling the same day replaces the value rather than duplicating it.
    poll_market(&FixedFeed(vec![quote("WCI", 0, 2300.0)]), &pool).await.unwrap();

    let snapshots = MarketIndex::latest_snapshots(&pool).await.unwrap();
    let wci = snapshots.iter().find(|s| s.code == "WCI").unwrap();
    assert_eq!(wci.value, 2300.0);
    assert_eq!(wci.previous_value, Some(2000.0));
    assert!((wci.change_pct.unwrap() - 15.0).abs() < 1e-9);
    let scfi = snapshots.iter().find(|s| s.code == "SCFI").unwrap();
    assert!(scfi.change.is_none());

    let history = MarketIndex::history("wci", Some(30), &pool).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].recorded_on < history[1].recorded_on);

    let err = MarketIndex::history("NOPE", None, &pool).await.unwrap_err();
    assert_eq!(code(&err), "NOT_FOUND");
}

struct StaticCollector;

#[async_trait]
impl NewsCollector for StaticCollector {
    async fn collect(&self, feed_url: &str) -> Result<Vec<RawArticle>> {
        if feed_url.contains("broken") {
            bail!("connection refused");
        }
        let article = |path: &str, title: &str| RawArticle {
            url: format!("https://wire.example/{path}"),
            title: title.into(),
            summary: None,
            published_at: Some(Utc::now()),
        };
        Ok(vec![
            article("tariffs?utm_source=rss", "New tariffs hit transpacific trade"),
            article("air", "Air cargo demand climbs as freighter capacity tightens"),
            article("air-dup", "Air cargo demand climbs as freighter capacity tightens again"),
        ])
    }
}

#[tokio::test]
async fn news_pipeline_stores_deduplicated_articles() {
    let (_container, pool) = postgres_container().await;

    NewsSource::create(
        &NewNewsSource {
            name: "Wire".into(),
            feed_url: "https://wire.example/feed".into(),
        },
        &pool,
    )
    .await
    .unwrap();
    let broken = NewsSource::create(
        &NewNewsSource {
            name: "Broken".into(),
            feed_url: "https://broken.example/feed".into(),
        },
        &pool,
    )
    .await
    .unwrap();
    let err = NewsSource::create(
        &NewNewsSource {
            name: "Wire again".into(),
            feed_url: "https://wire.example/feed".into(),
        },
        &pool,
    )
    .await
    .unwrap_err();
    assert_eq!(code(&err), "CONFLICT");

    let analyzer = NewsAnalyzer::new(RuleClassifier::new().unwrap(), None, 0.6, 20);
    let pipeline = NewsPipeline::new(Arc::new(StaticCollector), analyzer, 0.8, 72);

    let stats = pipeline.run(&pool).await.unwrap();
    assert_eq!(stats.sources, 2);
    assert_eq!(stats.failed_sources, 1);
    assert_eq!(stats.fetched, 3);
    assert_eq!(stats.near_duplicates, 1);
    assert_eq!(stats.inserted, 2);

    let sources = NewsSource::list(&pool).await.unwrap();
    let broken = sources.iter().find(|s| s.id == broken.id).unwrap();
    assert!(broken.last_error.as_deref().unwrap().contains("connection refused"));

    // Second run finds everything already stored.
    let again = pipeline.run(&pool).await.unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.duplicates + again.near_duplicates, 3);

    let trade = NewsArticle::list(Some(NewsCategory::TradePolicy), None, None, &pool)
        .await
        .unwrap();
    assert_eq!(trade.len(), 1);
    assert_eq!(trade[0].canonical_url, "https://wire.example/tariffs");

    let counts = NewsArticle::category_counts(&pool).await.unwrap();
    assert_eq!(counts.iter().map(|c| c.count).sum::<i64>(), 2);

    NewsSource::deactivate(broken.id, &pool).await.unwrap();
    let third = pipeline.run(&pool).await.unwrap();
    assert_eq!(third.sources, 1);
}

#[derive(Default)]
struct RecordingAgent {
    seen: Mutex<Vec<(String, Vec<Message>)>>,
}

#[async_trait]
impl ChatAgent for RecordingAgent {
    async fn chat(&self, system: &str, history: &[Message], _max_tokens: u32) -> Result<String> {
        self.seen
            .lock()
            .unwrap()
            .push((system.to_string(), history.to_vec()));
        Ok(format!("Reply #{}", history.len()))
    }
}

fn assistant_config(window: usize) -> (AssistantConfig, IdentityConfig) {
    (
        AssistantConfig {
            history_window: window,
            max_tokens: 256,
            system_prompt: "{{platform_name}} on {{today}}\n{{context}}".into(),
        },
        IdentityConfig {
            platform_name: "FreightDesk".into(),
            description: String::new(),
        },
    )
}

#[tokio::test]
async fn assistant_conversation() {
    let (_container, pool) = postgres_container().await;
    let (config, identity) = assistant_config(3);
    let agent = RecordingAgent::default();

    let session = ChatSession::create(None, &pool).await.unwrap();

    let err = send_message(session.id, "hello", None, &config, &identity, &pool)
        .await
        .unwrap_err();
    assert_eq!(code(&err), "UNAVAILABLE");

    let err = send_message(session.id, "   ", Some(&agent), &config, &identity, &pool)
        .await
        .unwrap_err();
    assert_eq!(code(&err), "VALIDATION");

    let reply = send_message(
        session.id,
        "What are current spot rates to Rotterdam?",
        Some(&agent),
        &config,
        &identity,
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(reply.role, "assistant");
    assert_eq!(reply.content, "Reply #1");

    send_message(session.id, "And to Hamburg?", Some(&agent), &config, &identity, &pool)
        .await
        .unwrap();

    let session = ChatSession::find_by_id(session.id, &pool).await.unwrap();
    assert_eq!(session.title.as_deref(), Some("What are current spot rates to Rotterdam?"));

    let messages = ChatMessage::list_for_session(session.id, &pool).await.unwrap();
    assert_eq!(messages.len(), 4);

    let seen = agent.seen.lock().unwrap();
    let (system, history) = &seen[1];
    assert!(system.starts_with("FreightDesk on "));
    assert!(system.contains("Open RFQs accepting bids: 0"));
    // Window of 3 holds the first exchange plus the new question.
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].role, MessageRole::User);
    assert_eq!(history[2].content, "And to Hamburg?");

    let err = send_message(uuid::Uuid::new_v4(), "hi", Some(&agent), &config, &identity, &pool)
        .await
        .unwrap_err();
    assert_eq!(code(&err), "NOT_FOUND");
}
