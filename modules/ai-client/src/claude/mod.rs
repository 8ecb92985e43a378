mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::error::AiError;
use crate::schema::{parse_tool_input, StructuredOutput};
use crate::traits::{ChatAgent, Message, MessageRole};

use client::ClaudeClient;
use types::*;

const STRUCTURED_TOOL_NAME: &str = "structured_response";

// =============================================================================
// Claude Agent
// =============================================================================

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AiError::Config("ANTHROPIC_API_KEY environment variable not set".into()))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Reuse a shared HTTP client (timeouts, connection pool).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> ClaudeClient {
        let client = ClaudeClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }

    // =========================================================================
    // Convenience methods
    // =========================================================================

    /// Structured extraction via forced tool use. Temperature is pinned to 0.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        debug!(type_name = T::type_name(), "Claude structured extraction");

        let mut request = ChatRequest::new(&self.model)
            .system(system_prompt)
            .message(WireMessage::user(user_prompt))
            .temperature(0.0)
            .tool(ToolDefinitionWire {
                name: STRUCTURED_TOOL_NAME.to_string(),
                description: "Return the structured answer.".to_string(),
                input_schema: T::tool_schema(),
            });
        request.tool_choice = Some(serde_json::json!({
            "type": "tool",
            "name": STRUCTURED_TOOL_NAME,
        }));

        let response = self.client().chat(&request).await?;

        let input = response
            .tool_input()
            .ok_or_else(|| AiError::EmptyResponse("no structured output in Claude response".into()))?;

        Ok(parse_tool_input(input)?)
    }

    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .system(system)
            .message(WireMessage::user(user))
            .temperature(0.0);

        let response = self.client().chat(&request).await?;

        response
            .text()
            .ok_or_else(|| AiError::EmptyResponse("no text in Claude response".into()).into())
    }
}

/// Convert generic messages to Claude's wire format. System messages are
/// folded into the top-level system prompt; leading assistant turns are
/// dropped because the API requires the first message to be from the user.
fn to_wire(system: &str, history: &[Message]) -> (String, Vec<WireMessage>) {
    let mut system_prompt = system.to_string();
    let mut messages = Vec::with_capacity(history.len());

    for msg in history {
        match msg.role {
            MessageRole::System => {
                if !system_prompt.is_empty() {
                    system_prompt.push_str("\n\n");
                }
                system_prompt.push_str(&msg.content);
            }
            MessageRole::User => messages.push(WireMessage::user(&msg.content)),
            MessageRole::Assistant => {
                if !messages.is_empty() {
                    messages.push(WireMessage::assistant(&msg.content));
                }
            }
        }
    }

    (system_prompt, messages)
}

// =============================================================================
// ChatAgent Implementation
// =============================================================================

#[async_trait]
impl ChatAgent for Claude {
    async fn chat(&self, system: &str, history: &[Message], max_tokens: u32) -> Result<String> {
        let (system_prompt, messages) = to_wire(system, history);
        if messages.is_empty() {
            return Err(anyhow!("Chat history has no user message"));
        }

        let mut request = ChatRequest::new(&self.model).max_tokens(max_tokens);
        if !system_prompt.is_empty() {
            request = request.system(system_prompt);
        }
        for message in messages {
            request = request.message(message);
        }

        let response = self.client().chat(&request).await?;

        response
            .text()
            .ok_or_else(|| AiError::EmptyResponse("no text in Claude response".into()).into())
    }
}
