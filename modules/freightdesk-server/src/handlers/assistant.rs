use ai_client::ChatAgent;
use axum::{extract::Path, http::StatusCode, Json};
use freightdesk_domains::assistant::{send_message, ChatMessage, ChatSession};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiResult;

#[derive(Debug, Default, Deserialize)]
pub struct NewSession {
    #[serde(default)]
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub content: String,
}

pub async fn create_session(
    deps: AppState,
    Json(body): Json<NewSession>,
) -> ApiResult<(StatusCode, Json<ChatSession>)> {
    let session = ChatSession::create(body.company_id, deps.pool()).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list_messages(
    deps: AppState,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    ChatSession::find_by_id(id, deps.pool()).await?;
    Ok(Json(ChatMessage::list_for_session(id, deps.pool()).await?))
}

pub async fn post_message(
    deps: AppState,
    Path(id): Path<Uuid>,
    Json(body): Json<SendMessage>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let agent = deps.claude.as_deref().map(|claude| claude as &dyn ChatAgent);
    let config = &deps.file_config;
    let reply = send_message(
        id,
        &body.content,
        agent,
        &config.assistant,
        &config.identity,
        deps.pool(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}
