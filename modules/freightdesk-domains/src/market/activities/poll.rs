use anyhow::Result;
use sqlx::PgPool;

use crate::market::feed::IndexFeed;
use crate::market::models::index::MarketIndex;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MarketPollStats {
    pub quotes: usize,
    pub recorded: usize,
    pub skipped: usize,
}

/// Pull quotes from the feed and store them. Bad quotes are skipped, not fatal.
pub async fn poll_market(feed: &dyn IndexFeed, pool: &PgPool) -> Result<MarketPollStats> {
    let quotes = feed.fetch().await?;
    let mut stats = MarketPollStats {
        quotes: quotes.len(),
        ..Default::default()
    };

    for quote in &quotes {
        if !quote.value.is_finite() {
            stats.skipped += 1;
            tracing::warn!(code = %quote.code, "Skipping market quote with non-finite value");
            continue;
        }
        let stored = async {
            let index = MarketIndex::upsert(
                &quote.code,
                quote.name.as_deref().unwrap_or_default(),
                quote.unit.as_deref(),
                None,
                pool,
            )
            .await?;
            MarketIndex::record_point(index.id, quote.date, quote.value, pool).await
        }
        .await;

        match stored {
            Ok(_) => stats.recorded += 1,
            Err(e) => {
                stats.skipped += 1;
                tracing::warn!(code = %quote.code, error = %e, "Skipping market quote");
            }
        }
    }

    tracing::info!(
        quotes = stats.quotes,
        recorded = stats.recorded,
        skipped = stats.skipped,
        "Market poll complete"
    );
    Ok(stats)
}
