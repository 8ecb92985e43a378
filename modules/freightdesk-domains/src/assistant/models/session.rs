use anyhow::Result;
use chrono::{DateTime, Utc};
use freightdesk_core::DomainError;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::directory::Company;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatSession {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub async fn create(company_id: Option<Uuid>, pool: &PgPool) -> Result<Self> {
        if let Some(company_id) = company_id {
            Company::find_by_id(company_id, pool).await?;
        }
        let session = sqlx::query_as::<_, Self>(
            "INSERT INTO chat_sessions (company_id) VALUES ($1) RETURNING *",
        )
        .bind(company_id)
        .fetch_one(pool)
        .await?;
        tracing::info!(session_id = %session.id, "Chat session started");
        Ok(session)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM chat_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DomainError::not_found("chat session", id).into())
    }

    /// Set the title only if it has not been set yet; always bumps `updated_at`.
    pub async fn touch(id: Uuid, title: Option<&str>, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE chat_sessions
            SET title = COALESCE(title, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(title)
        .execute(pool)
        .await?;
        Ok(())
    }
}
