use anyhow::Result;

/// Application configuration loaded from environment variables.
/// Contains only secrets and env-specific values; tunables live in the
/// TOML `FileConfig`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,

    // AI / LLM
    pub anthropic_api_key: Option<String>,

    // Market data feed
    pub market_feed_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")?,
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            market_feed_api_key: non_empty_var("MARKET_FEED_API_KEY"),
        };

        config.log_keys();
        Ok(config)
    }

    pub fn ai_enabled(&self) -> bool {
        self.anthropic_api_key.is_some()
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  ANTHROPIC_API_KEY: {}", preview_opt(&self.anthropic_api_key));
        tracing::info!("  MARKET_FEED_API_KEY: {}", preview_opt(&self.market_feed_api_key));
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn preview(val: &str) -> String {
    let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
    format!("{}...({} chars)", &val[..n], val.chars().count())
}

fn preview_opt(val: &Option<String>) -> String {
    match val {
        Some(v) if !v.is_empty() => preview(v),
        _ => "<not set>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_hides_secret() {
        assert_eq!(preview("sk-ant-abcdef"), "sk-an...(13 chars)");
        assert_eq!(preview("abc"), "abc...(3 chars)");
    }

    #[test]
    fn ai_enabled_follows_anthropic_key() {
        let mut config = AppConfig {
            database_url: "postgres://localhost/freightdesk".into(),
            anthropic_api_key: None,
            market_feed_api_key: None,
        };
        assert!(!config.ai_enabled());
        config.anthropic_api_key = Some("sk-ant-test".into());
        assert!(config.ai_enabled());
    }

    #[test]
    fn preview_opt_reports_missing() {
        assert_eq!(preview_opt(&None), "<not set>");
        assert_eq!(preview_opt(&Some(String::new())), "<not set>");
    }
}
