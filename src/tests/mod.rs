//! Cross-module tests: retrieval behavior end to end and the HTTP API.
//!
//! Most tests run against deterministic fake embedders. Tests against the
//! real model are marked #[ignore]; run with: cargo test -- --ignored

mod retrieval;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::semantic::{Embedder, EmbeddingError};

/// Hashes lowercase words into a fixed number of buckets.
///
/// Deterministic, and identical texts always produce identical vectors, which
/// is all the self-match and determinism properties need.
pub struct BagOfWordsEmbedder {
    dimensions: usize,
}

impl BagOfWordsEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Embedder for BagOfWordsEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

/// Returns fixed vectors for known texts and `default` for anything else.
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    default: Vec<f32>,
}

impl FixedEmbedder {
    pub fn new(pairs: Vec<(&str, Vec<f32>)>, default: Vec<f32>) -> Self {
        Self {
            vectors: pairs
                .into_iter()
                .map(|(text, v)| (text.to_string(), v))
                .collect(),
            default,
        }
    }
}

impl Embedder for FixedEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }

    fn dimensions(&self) -> usize {
        self.default.len()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Always fails, like a model that could not be loaded.
pub struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn encode(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::InitFailed("model file missing".to_string()))
    }

    fn dimensions(&self) -> usize {
        384
    }

    fn name(&self) -> &str {
        "broken"
    }
}
