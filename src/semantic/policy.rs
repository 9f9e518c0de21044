//! Confidence threshold and fallback selection.

use serde::Serialize;

use crate::knowledge::KnowledgeBase;
use crate::semantic::MatchResult;

/// Answer chosen for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub answer: String,
    pub confidence: f32,
    /// Matched entry, `None` when the fallback was returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_index: Option<usize>,
}

impl Resolution {
    pub fn fallback(knowledge_base: &KnowledgeBase) -> Self {
        Self {
            answer: knowledge_base.fallback_answer().to_string(),
            confidence: 0.0,
            entry_index: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.entry_index.is_none()
    }
}

/// Accept the match only when its score is strictly above `threshold`.
///
/// A score equal to the threshold falls back.
pub fn resolve(
    match_result: MatchResult,
    knowledge_base: &KnowledgeBase,
    threshold: f32,
) -> Resolution {
    match match_result.entry_index {
        Some(idx) if match_result.score > threshold => match knowledge_base.get(idx) {
            Some(entry) => Resolution {
                answer: entry.answer.clone(),
                confidence: match_result.score,
                entry_index: Some(idx),
            },
            None => {
                log::warn!("match index {} is outside the knowledge base", idx);
                Resolution::fallback(knowledge_base)
            }
        },
        _ => Resolution::fallback(knowledge_base),
    }
}
