//! Article categorisation: keyword rules first, AI for the uncertain rest.

pub mod ai;
pub mod rules;

use std::sync::Arc;

use crate::news::category::{ClassifiedBy, NewsCategory};

pub use ai::{AiVerdict, ArticleClassifier, ClaudeArticleClassifier, ClassifierItem};
pub use rules::{RuleClassifier, RuleVerdict};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub category: NewsCategory,
    pub confidence: f32,
    pub classified_by: ClassifiedBy,
}

pub struct NewsAnalyzer {
    rules: RuleClassifier,
    ai: Option<Arc<dyn ArticleClassifier>>,
    confidence_threshold: f32,
    batch_size: usize,
}

impl NewsAnalyzer {
    pub fn new(
        rules: RuleClassifier,
        ai: Option<Arc<dyn ArticleClassifier>>,
        confidence_threshold: f32,
        batch_size: usize,
    ) -> Self {
        Self {
            rules,
            ai,
            confidence_threshold,
            batch_size: batch_size.max(1),
        }
    }

    /// Classify `(title, summary)` pairs. Output is index-aligned with input.
    pub async fn classify(&self, articles: &[(String, Option<String>)]) -> Vec<Classification> {
        let mut results: Vec<Classification> = articles
            .iter()
            .map(|(title, summary)| {
                let verdict = self.rules.classify(title, summary.as_deref());
                Classification {
                    category: verdict.category,
                    confidence: verdict.confidence,
                    classified_by: ClassifiedBy::Rules,
                }
            })
            .collect();

        let Some(ai) = &self.ai else {
            return results;
        };

        let uncertain: Vec<ClassifierItem> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.confidence < self.confidence_threshold)
            .map(|(index, _)| ClassifierItem {
                index,
                title: articles[index].0.clone(),
                summary: articles[index].1.clone(),
            })
            .collect();

        for batch in uncertain.chunks(self.batch_size) {
            match ai.classify(batch).await {
                Ok(verdicts) => apply_verdicts(&mut results, batch, verdicts),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        batch = batch.len(),
                        "AI classification failed; keeping rule results"
                    );
                }
            }
        }

        results
    }
}

/// Replace rule results with AI verdicts that are more confident. Verdicts for
/// indices outside the batch or with unknown categories are ignored.
fn apply_verdicts(results: &mut [Classification], batch: &[ClassifierItem], verdicts: Vec<AiVerdict>) {
    for verdict in verdicts {
        if !batch.iter().any(|item| item.index == verdict.index) {
            tracing::debug!(index = verdict.index, "AI verdict for unknown index ignored");
            continue;
        }
        let Ok(category) = verdict.category.trim().to_lowercase().parse::<NewsCategory>() else {
            tracing::debug!(category = %verdict.category, "AI verdict with unknown category ignored");
            continue;
        };
        let confidence = verdict.confidence.clamp(0.0, 1.0);
        let Some(current) = results.get_mut(verdict.index) else {
            continue;
        };
        if confidence > current.confidence {
            *current = Classification {
                category,
                confidence,
                classified_by: ClassifiedBy::Ai,
            };
        }
    }
}
