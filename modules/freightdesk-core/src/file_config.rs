use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// TOML-backed configuration loaded from disk.
/// Secrets (API keys, DB URL) stay as env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub identity: IdentityConfig,
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub news: NewsConfig,
    pub market: MarketConfig,
    pub rfq: RfqConfig,
    pub comparison: ComparisonConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub platform_name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    pub assistant: String,
    pub news_classifier: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    pub confidence_threshold: f32,
    pub ai_batch_size: usize,
    pub poll_interval_minutes: u64,
    pub near_duplicate_threshold: f64,
    pub lookback_hours: i64,
    pub max_items_per_feed: usize,
    pub max_age_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    pub poll_interval_minutes: u64,
    pub feed_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RfqConfig {
    pub expiry_check_interval_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonConfig {
    pub price_weight: f64,
    pub transit_weight: f64,
    pub rating_weight: f64,
    pub validity_weight: f64,
    /// Multiplier converting one unit of the currency into USD.
    pub fx_to_usd: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    pub history_window: usize,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl FileConfig {
    /// Reject values that would make a job or scorer misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        let news = &self.news;
        if !(0.0..=1.0).contains(&news.confidence_threshold) {
            bail!("news.confidence_threshold must be within 0..=1");
        }
        if !(0.0..=1.0).contains(&news.near_duplicate_threshold) {
            bail!("news.near_duplicate_threshold must be within 0..=1");
        }
        if news.ai_batch_size == 0 {
            bail!("news.ai_batch_size must be at least 1");
        }
        if news.poll_interval_minutes == 0
            || self.market.poll_interval_minutes == 0
            || self.rfq.expiry_check_interval_minutes == 0
        {
            bail!("poll intervals must be at least one minute");
        }

        let c = &self.comparison;
        let weights = [c.price_weight, c.transit_weight, c.rating_weight, c.validity_weight];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            bail!("comparison weights must be non-negative and not all zero");
        }
        if c.fx_to_usd.values().any(|r| *r <= 0.0) {
            bail!("comparison.fx_to_usd rates must be positive");
        }

        if self.assistant.history_window == 0 {
            bail!("assistant.history_window must be at least 1");
        }
        crate::template::validate(&self.assistant.system_prompt, ASSISTANT_PROMPT_VARS)
            .context("assistant.system_prompt")?;
        Ok(())
    }
}

/// Load, parse and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(content).context("Failed to parse config TOML")?;
    config.validate()?;
    Ok(config)
}

/// Placeholders the assistant system prompt may use.
pub const ASSISTANT_PROMPT_VARS: &[&str] = &["platform_name", "today", "context"];

#[cfg(test)]
pub(crate) const SAMPLE: &str = r#"
[identity]
platform_name = "FreightDesk"
description = "B2B freight marketplace"

[server]
port = 9080
allowed_origins = []

[models]
assistant = "claude-sonnet-4-5-20250929"
news_classifier = "claude-haiku-4-5-20251001"

[news]
confidence_threshold = 0.6
ai_batch_size = 20
poll_interval_minutes = 30
near_duplicate_threshold = 0.8
lookback_hours = 72
max_items_per_feed = 50
max_age_days = 14

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
EUR = 1.08

[assistant]
history_window = 20
max_tokens = 1024
system_prompt = "You help {{platform_name}} users."
"#;
