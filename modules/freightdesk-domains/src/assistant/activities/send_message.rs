use std::collections::HashMap;

use ai_client::{ChatAgent, Message};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use freightdesk_core::file_config::{AssistantConfig, IdentityConfig};
use freightdesk_core::{template, DomainError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::assistant::models::message::{ChatMessage, ChatRole};
use crate::assistant::models::session::ChatSession;
use crate::market::{IndexSnapshot, MarketIndex};
use crate::rfqs::Rfq;

pub const MAX_MESSAGE_CHARS: usize = 4000;
const MAX_TITLE_CHARS: usize = 60;
const CONTEXT_INDEX_LIMIT: usize = 5;

/// Live marketplace figures folded into the system prompt.
#[derive(Debug, Clone, Default)]
pub struct AssistantContext {
    pub open_rfqs: i64,
    pub indices: Vec<IndexSnapshot>,
}

impl AssistantContext {
    pub async fn load(pool: &PgPool) -> Result<Self> {
        Ok(Self {
            open_rfqs: Rfq::count_open(pool).await?,
            indices: MarketIndex::latest_snapshots(pool).await?,
        })
    }

    pub fn render(&self) -> String {
        let mut lines = vec![format!("Open RFQs accepting bids: {}", self.open_rfqs)];
        if self.indices.is_empty() {
            lines.push("No market index data available.".to_string());
        } else {
            lines.push("Latest market indices:".to_string());
            for index in self.indices.iter().take(CONTEXT_INDEX_LIMIT) {
                let unit = index.unit.as_deref().map(|u| format!(" {u}")).unwrap_or_default();
                let change = index
                    .change_pct
                    .map(|pct| format!(" ({pct:+.1}%)"))
                    .unwrap_or_default();
                lines.push(format!(
                    "- {} ({}): {:.2}{} on {}{}",
                    index.name, index.code, index.value, unit, index.recorded_on, change
                ));
            }
        }
        lines.join("\n")
    }
}

pub fn validate_content(content: &str) -> Result<&str> {
    let content = content.trim();
    if content.is_empty() {
        bail!(DomainError::validation("message must not be empty"));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        bail!(DomainError::validation(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(content)
}

pub fn session_title(first_message: &str) -> String {
    let line = first_message.lines().next().unwrap_or_default().trim();
    let end = line
        .char_indices()
        .nth(MAX_TITLE_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    line[..end].trim_end().to_string()
}

pub fn system_prompt(
    config: &AssistantConfig,
    identity: &IdentityConfig,
    today: NaiveDate,
    context: &AssistantContext,
) -> String {
    let vars = HashMap::from([
        ("platform_name", identity.platform_name.clone()),
        ("today", today.to_string()),
        ("context", context.render()),
    ]);
    template::render(&config.system_prompt, &vars)
}

/// Store a user message, ask the model, store and return its reply.
pub async fn send_message(
    session_id: Uuid,
    content: &str,
    agent: Option<&dyn ChatAgent>,
    config: &AssistantConfig,
    identity: &IdentityConfig,
    pool: &PgPool,
) -> Result<ChatMessage> {
    let Some(agent) = agent else {
        bail!(DomainError::Unavailable(
            "assistant is not configured (no ANTHROPIC_API_KEY)".into()
        ));
    };
    let content = validate_content(content)?;
    let session = ChatSession::find_by_id(session_id, pool).await?;

    ChatMessage::create(session.id, ChatRole::User, content, pool).await?;
    let title = session.title.is_none().then(|| session_title(content));
    ChatSession::touch(session.id, title.as_deref(), pool).await?;

    let history: Vec<Message> = ChatMessage::recent(session.id, config.history_window, pool)
        .await?
        .iter()
        .filter_map(ChatMessage::to_agent_message)
        .collect();

    let context = AssistantContext::load(pool).await?;
    let system = system_prompt(config, identity, chrono::Utc::now().date_naive(), &context);

    let reply = match agent.chat(&system, &history, config.max_tokens).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(session_id = %session.id, error = %e, "Assistant model call failed");
            bail!(DomainError::Unavailable("assistant failed to respond".into()));
        }
    };

    let message = ChatMessage::create(session.id, ChatRole::Assistant, reply.trim(), pool).await?;
    ChatSession::touch(session.id, None, pool).await?;

    tracing::info!(
        session_id = %session.id,
        history = history.len(),
        reply_len = message.content.len(),
        "Assistant replied"
    );
    Ok(message)
}
