use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use freightdesk_core::{page_limit, page_offset};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::news::category::NewsCategory;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsArticle {
    pub id: Uuid,
    pub source_id: Option<Uuid>,
    pub url: String,
    pub canonical_url: String,
    pub title: String,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: String,
    pub confidence: f32,
    pub classified_by: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: Option<Uuid>,
    pub url: String,
    pub canonical_url: String,
    pub title: String,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: String,
    pub confidence: f32,
    pub classified_by: String,
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Canonical URLs and hashes that are already stored.
#[derive(Debug, Default)]
pub struct StoredKeys {
    pub urls: HashSet<String>,
    pub hashes: HashSet<String>,
}

impl StoredKeys {
    pub fn contains(&self, canonical_url: &str, hash: &str) -> bool {
        self.urls.contains(canonical_url) || self.hashes.contains(hash)
    }
}

impl NewsArticle {
    /// Insert unless an article with the same canonical URL or hash exists.
    /// Returns whether a row was written.
    pub async fn insert(article: &NewArticle, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO news_articles (
                source_id, url, canonical_url, title, summary, published_at,
                category, confidence, classified_by, content_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(article.source_id)
        .bind(&article.url)
        .bind(&article.canonical_url)
        .bind(&article.title)
        .bind(&article.summary)
        .bind(article.published_at)
        .bind(&article.category)
        .bind(article.confidence)
        .bind(&article.classified_by)
        .bind(&article.content_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn stored_keys(urls: &[String], hashes: &[String], pool: &PgPool) -> Result<StoredKeys> {
        if urls.is_empty() && hashes.is_empty() {
            return Ok(StoredKeys::default());
        }
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT canonical_url, content_hash FROM news_articles
            WHERE canonical_url = ANY($1) OR content_hash = ANY($2)
            "#,
        )
        .bind(urls)
        .bind(hashes)
        .fetch_all(pool)
        .await?;

        let mut keys = StoredKeys::default();
        for (url, hash) in rows {
            keys.urls.insert(url);
            keys.hashes.insert(hash);
        }
        Ok(keys)
    }

    /// Titles stored in the last `hours` hours, for near-duplicate checks.
    pub async fn recent_titles(hours: i64, pool: &PgPool) -> Result<Vec<String>> {
        let since = Utc::now() - Duration::hours(hours);
        sqlx::query_scalar("SELECT title FROM news_articles WHERE created_at >= $1")
            .bind(since)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list(
        category: Option<NewsCategory>,
        limit: Option<i64>,
        offset: Option<i64>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM news_articles
            WHERE ($1::TEXT IS NULL OR category = $1)
            ORDER BY COALESCE(published_at, created_at) DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(category.map(|c| c.as_str()))
        .bind(page_limit(limit))
        .bind(page_offset(offset))
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn category_counts(pool: &PgPool) -> Result<Vec<CategoryCount>> {
        sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT category, COUNT(*) AS count
            FROM news_articles
            GROUP BY category
            ORDER BY count DESC, category
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
