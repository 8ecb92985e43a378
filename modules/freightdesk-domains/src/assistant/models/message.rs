use ai_client::Message;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

freightdesk_core::text_enum! {
    ChatRole {
        User => "user",
        Assistant => "assistant",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub async fn create(session_id: Uuid, role: ChatRole, content: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO chat_messages (session_id, role, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_for_session(session_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM chat_messages WHERE session_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// The last `limit` messages, oldest first.
    pub async fn recent(session_id: Uuid, limit: usize, pool: &PgPool) -> Result<Vec<Self>> {
        let mut messages = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM chat_messages
            WHERE session_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(session_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await?;
        messages.reverse();
        Ok(messages)
    }

    pub fn to_agent_message(&self) -> Option<Message> {
        match self.role.parse::<ChatRole>().ok()? {
            ChatRole::User => Some(Message::user(&self.content)),
            ChatRole::Assistant => Some(Message::assistant(&self.content)),
        }
    }
}
