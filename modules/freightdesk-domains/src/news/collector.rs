// RSS/Atom news collection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

const MAX_SUMMARY_BYTES: usize = 2000;
// Wide enough that html2text never wraps a summary line.
const RENDER_WIDTH: usize = 4096;

/// An article as it came off a feed, before dedup and classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArticle {
    pub url: String,
    pub title: String,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait NewsCollector: Send + Sync {
    async fn collect(&self, feed_url: &str) -> Result<Vec<RawArticle>>;
}

pub struct RssCollector {
    client: reqwest::Client,
    max_items: usize,
    max_age_days: i64,
}

impl RssCollector {
    pub fn new(client: reqwest::Client, max_items: usize, max_age_days: i64) -> Self {
        Self {
            client,
            max_items,
            max_age_days,
        }
    }
}

#[async_trait]
impl NewsCollector for RssCollector {
    async fn collect(&self, feed_url: &str) -> Result<Vec<RawArticle>> {
        let bytes = self
            .client
            .get(feed_url)
            .header("User-Agent", "freightdesk-news/0.1")
            .send()
            .await
            .context("News feed fetch failed")?
            .error_for_status()
            .context("News feed returned an error status")?
            .bytes()
            .await
            .context("Failed to read news feed body")?;

        let items = parse_feed(&bytes, self.max_items, self.max_age_days, Utc::now())?;
        info!(feed_url, items = items.len(), "news feed parsed");
        Ok(items)
    }
}

/// Parse an RSS/Atom document into articles, newest first.
pub fn parse_feed(
    bytes: &[u8],
    max_items: usize,
    max_age_days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<RawArticle>> {
    let feed = feed_rs::parser::parse(bytes).context("Failed to parse RSS/Atom feed")?;
    let cutoff = now - Duration::days(max_age_days);

    let mut items: Vec<RawArticle> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
            let title = entry
                .title
                .map(|t| strip_html(&t.content))
                .filter(|t| !t.is_empty())?;

            let published_at = entry.published.or(entry.updated);
            if published_at.is_some_and(|date| date < cutoff) {
                return None;
            }

            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .map(|s| strip_html(&s))
                .filter(|s| !s.is_empty())
                .map(|s| ai_client::truncate_to_char_boundary(&s, MAX_SUMMARY_BYTES).to_string());

            Some(RawArticle {
                url,
                title,
                summary,
                published_at,
            })
        })
        .collect();

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    items.truncate(max_items);
    Ok(items)
}

/// Render markup to plain text and collapse whitespace.
pub fn strip_html(input: &str) -> String {
    let text = html2text::config::plain_no_decorate()
        .string_from_read(input.as_bytes(), RENDER_WIDTH)
        .unwrap_or_else(|_| input.to_string());
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Freight Wire</title>
    <link>https://freightwire.example</link>
    <description>Logistics news</description>
    <item>
      <title>Older rate story</title>
      <link>https://freightwire.example/older</link>
      <pubDate>Mon, 05 Oct 2026 08:00:00 GMT</pubDate>
      <description>&lt;p&gt;Spot rates &lt;b&gt;slip&lt;/b&gt; again&lt;/p&gt;</description>
    </item>
    <item>
      <title>Newest port story</title>
      <link>https://freightwire.example/newest</link>
      <pubDate>Wed, 14 Oct 2026 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Ancient news</title>
      <link>https://freightwire.example/ancient</link>
      <pubDate>Thu, 01 Jan 2026 08:00:00 GMT</pubDate>
    </item>
    <item>
      <link>https://freightwire.example/untitled</link>
      <pubDate>Wed, 14 Oct 2026 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn parses_filters_and_sorts() {
        let items = parse_feed(RSS.as_bytes(), 50, 14, now()).unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest port story", "Older rate story"]);
        assert_eq!(items[1].summary.as_deref(), Some("Spot rates slip again"));
        assert_eq!(items[0].url, "https://freightwire.example/newest");
        assert!(items[0].summary.is_none());
    }

    #[test]
    fn truncates_to_max_items() {
        let items = parse_feed(RSS.as_bytes(), 1, 14, now()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Newest port story");
    }

    #[test]
    fn invalid_feed_is_an_error() {
        assert!(parse_feed(b"<html>not a feed</html>", 10, 14, now()).is_err());
    }

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(
            strip_html("<p>Rates &amp; capacity</p>\n<br/>  <em>update</em>"),
            "Rates & capacity update"
        );
        assert_eq!(strip_html("plain"), "plain");
    }

    #[test]
    fn strip_html_decodes_entities() {
        assert_eq!(
            strip_html("<p>Maersk&#8217;s new loop &mdash; rates&nbsp;up</p>"),
            "Maersk\u{2019}s new loop \u{2014} rates up"
        );
        assert_eq!(strip_html("Ports &amp; terminals"), "Ports & terminals");
    }

    #[test]
    fn strip_html_keeps_literal_angle_brackets() {
        assert_eq!(
            strip_html("Spot rates < $2,000 while demand > supply"),
            "Spot rates < $2,000 while demand > supply"
        );
    }

    #[test]
    fn strip_html_drops_tags_without_decoration() {
        assert_eq!(
            strip_html("<div><b>Rates</b> <em>climb</em><br/>on the\n  Pacific</div>"),
            "Rates climb on the Pacific"
        );
    }
}
