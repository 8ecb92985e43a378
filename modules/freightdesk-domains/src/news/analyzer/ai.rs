use std::sync::Arc;

use ai_client::Claude;
use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::news::category::NewsCategory;

/// An article handed to the AI classifier. `index` is echoed back in the verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierItem {
    pub index: usize,
    pub title: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct AiVerdict {
    /// Index of the article being classified.
    pub index: usize,
    /// One of the category codes listed in the instructions.
    pub category: String,
    /// 0.0 to 1.0.
    pub confidence: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ClassificationBatch {
    classifications: Vec<AiVerdict>,
}

#[async_trait]
pub trait ArticleClassifier: Send + Sync {
    async fn classify(&self, items: &[ClassifierItem]) -> Result<Vec<AiVerdict>>;
}

pub struct ClaudeArticleClassifier {
    claude: Arc<Claude>,
}

impl ClaudeArticleClassifier {
    pub fn new(claude: Arc<Claude>) -> Self {
        Self { claude }
    }
}

fn system_prompt() -> String {
    let codes: Vec<&str> = NewsCategory::ALL.iter().map(|c| c.as_str()).collect();
    format!(
        "You classify freight and logistics news headlines. \
         Assign each article exactly one category from: {}. \
         Use `general` when nothing else fits. \
         Return one classification per article, echoing its index, \
         with a confidence between 0.0 and 1.0.",
        codes.join(", ")
    )
}

#[async_trait]
impl ArticleClassifier for ClaudeArticleClassifier {
    async fn classify(&self, items: &[ClassifierItem]) -> Result<Vec<AiVerdict>> {
        let user = serde_json::to_string_pretty(items)?;
        let batch: ClassificationBatch = self.claude.extract(system_prompt(), user).await?;
        tracing::debug!(
            requested = items.len(),
            returned = batch.classifications.len(),
            "AI news classification batch"
        );
        Ok(batch.classifications)
    }
}
