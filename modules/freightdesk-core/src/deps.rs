use crate::config::AppConfig;
use crate::file_config::FileConfig;
use ai_client::Claude;
use sqlx::PgPool;
use std::sync::Arc;

/// Central dependency container passed to all handlers and jobs.
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub http_client: reqwest::Client,
    /// Absent when no Anthropic key is configured; AI features degrade.
    pub claude: Option<Arc<Claude>>,
    pub config: AppConfig,
    pub file_config: Arc<FileConfig>,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        http_client: reqwest::Client,
        claude: Option<Arc<Claude>>,
        config: AppConfig,
        file_config: Arc<FileConfig>,
    ) -> Self {
        Self {
            db_pool,
            http_client,
            claude,
            config,
            file_config,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db_pool
    }
}
