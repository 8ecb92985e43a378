use std::sync::Arc;

use ai_client::Claude;
use anyhow::Result;
use futures::future::join_all;
use freightdesk_core::ServerDeps;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::news::analyzer::{ArticleClassifier, ClaudeArticleClassifier, NewsAnalyzer, RuleClassifier};
use crate::news::category::ClassifiedBy;
use crate::news::collector::{NewsCollector, RawArticle, RssCollector};
use crate::news::dedup::{canonicalize_url, content_hash, normalize_title, DedupVerdict, Deduplicator};
use crate::news::models::article::{NewArticle, NewsArticle, StoredKeys};
use crate::news::models::source::NewsSource;

/// Counters for one pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewsRunStats {
    pub sources: usize,
    pub failed_sources: usize,
    pub fetched: usize,
    pub duplicates: usize,
    pub near_duplicates: usize,
    pub classified_by_ai: usize,
    pub inserted: usize,
}

/// Raw article tagged with the source it came from.
#[derive(Debug, Clone)]
pub struct CollectedArticle {
    pub source_id: Option<Uuid>,
    pub article: RawArticle,
}

pub struct NewsPipeline {
    collector: Arc<dyn NewsCollector>,
    analyzer: NewsAnalyzer,
    near_duplicate_threshold: f64,
    lookback_hours: i64,
}

impl NewsPipeline {
    pub fn new(
        collector: Arc<dyn NewsCollector>,
        analyzer: NewsAnalyzer,
        near_duplicate_threshold: f64,
        lookback_hours: i64,
    ) -> Self {
        Self {
            collector,
            analyzer,
            near_duplicate_threshold,
            lookback_hours,
        }
    }

    /// RSS collection plus Claude classification when an API key is configured.
    pub fn from_deps(deps: &ServerDeps) -> Result<Self> {
        let news = &deps.file_config.news;
        let collector = Arc::new(RssCollector::new(
            deps.http_client.clone(),
            news.max_items_per_feed,
            news.max_age_days,
        ));

        let classifier: Option<Arc<dyn ArticleClassifier>> =
            deps.config.anthropic_api_key.as_ref().map(|key| {
                let claude = Claude::new(key, &deps.file_config.models.news_classifier)
                    .with_http_client(deps.http_client.clone());
                Arc::new(ClaudeArticleClassifier::new(Arc::new(claude))) as Arc<dyn ArticleClassifier>
            });

        let analyzer = NewsAnalyzer::new(
            RuleClassifier::new()?,
            classifier,
            news.confidence_threshold,
            news.ai_batch_size,
        );
        Ok(Self::new(
            collector,
            analyzer,
            news.near_duplicate_threshold,
            news.lookback_hours,
        ))
    }

    /// Collect every active source, dedup, classify and store.
    pub async fn run(&self, pool: &PgPool) -> Result<NewsRunStats> {
        let sources = NewsSource::list_active(pool).await?;
        let mut stats = NewsRunStats {
            sources: sources.len(),
            ..Default::default()
        };

        let fetches =
            join_all(sources.iter().map(|source| self.collector.collect(&source.feed_url))).await;
        let collected = Self::gather(&sources, fetches, &mut stats, pool).await;

        let urls: Vec<String> = collected.iter().map(|c| canonicalize_url(&c.article.url)).collect();
        let hashes: Vec<String> = collected.iter().map(|c| content_hash(&c.article.title)).collect();
        let stored = NewsArticle::stored_keys(&urls, &hashes, pool).await?;
        let recent = NewsArticle::recent_titles(self.lookback_hours, pool).await?;

        let articles = self.prepare(collected, &stored, recent, &mut stats).await;

        for article in &articles {
            if NewsArticle::insert(article, pool).await? {
                stats.inserted += 1;
            } else {
                stats.duplicates += 1;
            }
        }

        info!(
            sources = stats.sources,
            failed_sources = stats.failed_sources,
            fetched = stats.fetched,
            duplicates = stats.duplicates,
            near_duplicates = stats.near_duplicates,
            classified_by_ai = stats.classified_by_ai,
            inserted = stats.inserted,
            "News pipeline run complete"
        );
        Ok(stats)
    }

    /// Pair fetch results with their sources and record each fetch on the
    /// source row. Bookkeeping failures are logged; they never drop articles.
    pub async fn gather(
        sources: &[NewsSource],
        fetches: Vec<Result<Vec<RawArticle>>>,
        stats: &mut NewsRunStats,
        pool: &PgPool,
    ) -> Vec<CollectedArticle> {
        let mut collected = Vec::new();
        for (source, fetched) in sources.iter().zip(fetches) {
            let fetch_error = match fetched {
                Ok(items) => {
                    collected.extend(items.into_iter().map(|article| CollectedArticle {
                        source_id: Some(source.id),
                        article,
                    }));
                    None
                }
                Err(e) => {
                    stats.failed_sources += 1;
                    warn!(source = %source.name, feed_url = %source.feed_url, error = %e, "News source failed");
                    Some(format!("{e:#}"))
                }
            };

            if let Err(e) = NewsSource::record_fetch(source.id, fetch_error.as_deref(), pool).await {
                warn!(source = %source.name, error = %e, "Failed to record news source fetch");
            }
        }
        collected
    }

    /// Dedup and classify collected articles into rows ready to insert.
    pub async fn prepare(
        &self,
        collected: Vec<CollectedArticle>,
        stored: &StoredKeys,
        recent_titles: Vec<String>,
        stats: &mut NewsRunStats,
    ) -> Vec<NewArticle> {
        stats.fetched += collected.len();

        let mut dedup =
            Deduplicator::new(self.near_duplicate_threshold).with_recent_titles(recent_titles);
        let mut fresh = Vec::new();
        for item in collected {
            let canonical = canonicalize_url(&item.article.url);
            let hash = content_hash(&item.article.title);
            let title = normalize_title(&item.article.title);
            match dedup.check(&canonical, &hash, &title, stored.contains(&canonical, &hash)) {
                DedupVerdict::New => fresh.push((item, canonical, hash)),
                DedupVerdict::Exact => stats.duplicates += 1,
                DedupVerdict::NearDuplicate => stats.near_duplicates += 1,
            }
        }

        let texts: Vec<(String, Option<String>)> = fresh
            .iter()
            .map(|(item, _, _)| (item.article.title.clone(), item.article.summary.clone()))
            .collect();
        let classifications = self.analyzer.classify(&texts).await;

        fresh
            .into_iter()
            .zip(classifications)
            .map(|((item, canonical_url, content_hash), class)| {
                if class.classified_by == ClassifiedBy::Ai {
                    stats.classified_by_ai += 1;
                }
                NewArticle {
                    source_id: item.source_id,
                    url: item.article.url,
                    canonical_url,
                    title: item.article.title,
                    summary: item.article.summary,
                    published_at: item.article.published_at,
                    category: class.category.to_string(),
                    confidence: class.confidence,
                    classified_by: class.classified_by.to_string(),
                    content_hash,
                }
            })
            .collect()
    }
}
