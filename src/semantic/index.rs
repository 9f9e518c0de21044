//! In-memory retrieval index with exhaustive cosine similarity search.
//!
//! Owns the knowledge base and its embedding table as parallel arrays:
//! `table[i]` is always the embedding of `knowledge_base.entries()[i].question`.
//! Both are fixed at `build` and never mutated afterward, so the index can be
//! shared across threads without locking.

use crate::knowledge::KnowledgeBase;
use crate::semantic::{Embedder, EngineError};

/// Best match for a query vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Position of the winning entry, `None` for an empty table or a zero query
    pub entry_index: Option<usize>,
    /// Cosine similarity in [-1.0, 1.0], never NaN
    pub score: f32,
}

impl MatchResult {
    pub const NONE: MatchResult = MatchResult {
        entry_index: None,
        score: 0.0,
    };
}

pub struct RetrievalIndex {
    knowledge_base: KnowledgeBase,
    table: Vec<Vec<f32>>,
    dimensions: usize,
}

impl RetrievalIndex {
    /// Embed every question in order and pair the results with the entries.
    pub fn build(
        knowledge_base: KnowledgeBase,
        embedder: &dyn Embedder,
    ) -> Result<Self, EngineError> {
        if knowledge_base.is_empty() {
            return Err(EngineError::EmptyKnowledgeBase);
        }

        let table = embedder.encode_all(&knowledge_base.questions())?;

        if table.len() != knowledge_base.len() {
            return Err(EngineError::ModelUnavailable(format!(
                "embedder returned {} vectors for {} questions",
                table.len(),
                knowledge_base.len()
            )));
        }

        let dimensions = embedder.dimensions();
        if let Some(idx) = table.iter().position(|v| v.len() != dimensions) {
            return Err(EngineError::ModelUnavailable(format!(
                "embedding #{} has {} dimensions, expected {}",
                idx,
                table[idx].len(),
                dimensions
            )));
        }

        log::info!(
            "Indexed {} knowledge base entries with '{}'",
            table.len(),
            embedder.name()
        );

        Ok(Self {
            knowledge_base,
            table,
            dimensions,
        })
    }

    /// Assemble an index from precomputed parts without the emptiness check.
    ///
    /// Lengths must still agree; anything else would break the parallel-array
    /// invariant.
    #[cfg(test)]
    pub(crate) fn from_parts(
        knowledge_base: KnowledgeBase,
        table: Vec<Vec<f32>>,
    ) -> Result<Self, EngineError> {
        if table.len() != knowledge_base.len() {
            return Err(EngineError::ModelUnavailable(format!(
                "{} vectors for {} entries",
                table.len(),
                knowledge_base.len()
            )));
        }
        let dimensions = table.first().map(Vec::len).unwrap_or(0);
        Ok(Self {
            knowledge_base,
            table,
            dimensions,
        })
    }

    /// Score `query` against every entry and return the best one.
    ///
    /// Ties go to the lowest index. An empty table or a zero-magnitude query
    /// yields [`MatchResult::NONE`].
    pub fn best_match(&self, query: &[f32]) -> MatchResult {
        let query_norm = l2_norm(query);
        if query_norm == 0.0 || !query_norm.is_finite() {
            return MatchResult::NONE;
        }

        let mut best = MatchResult::NONE;
        for (idx, target) in self.table.iter().enumerate() {
            let score = cosine_similarity(query, query_norm, target);
            // strict `>` keeps the first occurrence on ties
            if best.entry_index.is_none() || score > best.score {
                best = MatchResult {
                    entry_index: Some(idx),
                    score,
                };
            }
        }

        best
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Compute L2 norm of a vector.
fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity with `query_norm` precomputed.
///
/// Zero-magnitude vectors, mismatched lengths and non-finite results all
/// score 0.0 so they can never poison the max selection.
fn cosine_similarity(query: &[f32], query_norm: f32, target: &[f32]) -> f32 {
    if query.len() != target.len() {
        return 0.0;
    }

    let target_norm = l2_norm(target);
    if query_norm == 0.0 || target_norm == 0.0 {
        return 0.0;
    }

    let dot_product: f32 = query.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    let score = dot_product / (query_norm * target_norm);
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
