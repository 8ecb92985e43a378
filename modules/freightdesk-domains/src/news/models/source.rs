use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use freightdesk_core::DomainError;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsSource {
    pub id: Uuid,
    pub name: String,
    pub feed_url: String,
    pub active: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNewsSource {
    pub name: String,
    pub feed_url: String,
}

impl NewNewsSource {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!(DomainError::validation("name must not be empty"));
        }
        match url::Url::parse(self.feed_url.trim()) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
            _ => bail!(DomainError::validation("feed_url must be an http(s) URL")),
        }
    }
}

impl NewsSource {
    pub async fn create(input: &NewNewsSource, pool: &PgPool) -> Result<Self> {
        input.validate()?;
        let result = sqlx::query_as::<_, Self>(
            "INSERT INTO news_sources (name, feed_url) VALUES ($1, $2) RETURNING *",
        )
        .bind(input.name.trim())
        .bind(input.feed_url.trim())
        .fetch_one(pool)
        .await;

        match result {
            Ok(source) => {
                tracing::info!(source_id = %source.id, feed_url = %source.feed_url, "News source added");
                Ok(source)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                bail!(DomainError::conflict("a source with this feed_url already exists"))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM news_sources ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM news_sources WHERE active ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn deactivate(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE news_sources SET active = FALSE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("news source", id).into())
    }

    /// Stamp a fetch attempt; `error` is cleared on success.
    pub async fn record_fetch(id: Uuid, error: Option<&str>, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE news_sources SET last_fetched_at = NOW(), last_error = $2 WHERE id = $1")
            .bind(id)
            .bind(error)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> NewNewsSource {
        NewNewsSource {
            name: "Loadstar".into(),
            feed_url: url.into(),
        }
    }

    #[test]
    fn feed_url_must_be_http() {
        assert!(source("https://theloadstar.com/feed/").validate().is_ok());
        assert!(source("ftp://example.com/feed").validate().is_err());
        assert!(source("not a url").validate().is_err());
    }
}
