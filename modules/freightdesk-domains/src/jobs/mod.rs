//! Background polling loops started with the server.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use freightdesk_core::ServerDeps;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::market::{poll_market, HttpIndexFeed};
use crate::news::NewsPipeline;
use crate::rfqs::Rfq;

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

/// Run `job` every `period`, first tick immediately. Failures are logged and
/// the loop keeps going; ticks missed while a run overran are skipped.
pub fn spawn_interval<F, Fut>(name: &'static str, period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(job = name, period_secs = period.as_secs(), "Job scheduled");

        loop {
            interval.tick().await;
            if let Err(e) = job().await {
                tracing::error!(job = name, error = ?e, "Job run failed");
            }
        }
    })
}

/// Start the news, market and RFQ-expiry loops.
pub fn spawn_jobs(deps: Arc<ServerDeps>) -> Result<Vec<JoinHandle<()>>> {
    let config = deps.file_config.clone();
    let mut handles = Vec::new();

    let pipeline = Arc::new(NewsPipeline::from_deps(&deps)?);
    let news_deps = deps.clone();
    handles.push(spawn_interval(
        "news",
        minutes(config.news.poll_interval_minutes),
        move || {
            let pipeline = pipeline.clone();
            let deps = news_deps.clone();
            async move {
                pipeline.run(deps.pool()).await?;
                Ok(())
            }
        },
    ));

    match &config.market.feed_url {
        Some(url) => {
            let feed = Arc::new(HttpIndexFeed::new(
                deps.http_client.clone(),
                url.clone(),
                deps.config.market_feed_api_key.clone(),
            ));
            let market_deps = deps.clone();
            handles.push(spawn_interval(
                "market",
                minutes(config.market.poll_interval_minutes),
                move || {
                    let feed = feed.clone();
                    let deps = market_deps.clone();
                    async move {
                        poll_market(feed.as_ref(), deps.pool()).await?;
                        Ok(())
                    }
                },
            ));
        }
        None => tracing::info!("market.feed_url not set; market polling disabled"),
    }

    let rfq_deps = deps.clone();
    handles.push(spawn_interval(
        "rfq_expiry",
        minutes(config.rfq.expiry_check_interval_minutes),
        move || {
            let deps = rfq_deps.clone();
            async move {
                let closed = Rfq::close_expired(deps.pool()).await?;
                if closed > 0 {
                    tracing::info!(closed, "Closed RFQs past their deadline");
                }
                Ok(())
            }
        },
    ));

    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn interval_keeps_running_after_failures() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let handle = spawn_interval("flaky", Duration::from_secs(60), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n % 2 == 0 {
                    anyhow::bail!("transient failure {n}");
                }
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_secs(60 * 3 + 1)).await;
        handle.abort();
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }
}
