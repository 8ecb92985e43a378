use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use freightdesk_server::routes;

#[derive(Parser)]
#[command(name = "freightdesk-server", about = "FreightDesk freight marketplace server")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, default_value = "./config/freightdesk.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting freightdesk-server");

    let cli = Cli::parse();

    let config_path = cli.config.canonicalize().with_context(|| {
        format!(
            "Config file not found: {}. Create one or specify --config <path>",
            cli.config.display()
        )
    })?;
    tracing::info!(config = %config_path.display(), "Loading config");

    let file_config = Arc::new(freightdesk_core::file_config::load_config(&config_path)?);
    let port = file_config.server.port;

    // Secrets come from env vars
    let config = freightdesk_core::AppConfig::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    freightdesk_domains::MIGRATOR.run(&pool).await?;
    tracing::info!("Migrations complete");

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let claude = config.anthropic_api_key.as_ref().map(|key| {
        Arc::new(
            ai_client::Claude::new(key, &file_config.models.assistant)
                .with_http_client(http_client.clone()),
        )
    });
    if !config.ai_enabled() {
        tracing::warn!("ANTHROPIC_API_KEY not set; assistant disabled, news uses rules only");
    }

    let deps = Arc::new(freightdesk_core::ServerDeps::new(
        pool,
        http_client,
        claude,
        config,
        file_config,
    ));

    let jobs = freightdesk_domains::jobs::spawn_jobs(deps.clone())?;
    tracing::info!(jobs = jobs.len(), "Background jobs started");

    let app = routes::build_router(deps);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}
