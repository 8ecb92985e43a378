use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

/// One index value as published by an external feed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IndexQuote {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    pub date: NaiveDate,
    pub value: f64,
}

/// Source of market index quotes.
#[async_trait]
pub trait IndexFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<IndexQuote>>;
}

/// Reads a JSON array of quotes from a configured URL.
pub struct HttpIndexFeed {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpIndexFeed {
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl IndexFeed for HttpIndexFeed {
    async fn fetch(&self) -> Result<Vec<IndexQuote>> {
        let mut request = self
            .client
            .get(&self.url)
            .header("User-Agent", "freightdesk/0.1");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let quotes = request
            .send()
            .await
            .context("Market feed request failed")?
            .error_for_status()
            .context("Market feed returned an error status")?
            .json::<Vec<IndexQuote>>()
            .await
            .context("Failed to decode market feed JSON")?;

        tracing::debug!(url = %self.url, quotes = quotes.len(), "Market feed fetched");
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_feed_payload() {
        let json = r#"[
            {"code": "SCFI", "name": "Shanghai Containerized Freight Index", "unit": "points", "date": "2026-10-09", "value": 1432.5},
            {"code": "WCI", "date": "2026-10-09", "value": 2210}
        ]"#;
        let quotes: Vec<IndexQuote> = serde_json::from_str(json).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1].name, None);
        assert_eq!(quotes[1].value, 2210.0);
        assert_eq!(quotes[0].date, NaiveDate::from_ymd_opt(2026, 10, 9).unwrap());
    }
}
