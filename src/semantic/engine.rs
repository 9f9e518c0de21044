//! Retrieval engine: the immutable handle request handlers share.
//!
//! Bundles the embedder, the retrieval index and the confidence threshold.
//! Everything is built by `initialize` and read-only afterward, so an
//! `Arc<RetrievalEngine>` can be used from any number of threads without a
//! lock.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::RetrievalConfig;
use crate::knowledge::KnowledgeBase;
use crate::semantic::{
    resolve, Embedder, EmbeddingError, EmbeddingModel, Resolution, RetrievalIndex,
};

/// Startup failures. Query resolution itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("knowledge base has no entries")]
    EmptyKnowledgeBase,
}

impl From<EmbeddingError> for EngineError {
    fn from(err: EmbeddingError) -> Self {
        EngineError::ModelUnavailable(err.to_string())
    }
}

/// Readiness snapshot for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub ready: bool,
    pub model: String,
    pub dimensions: usize,
    pub entries: usize,
}

pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    index: RetrievalIndex,
    threshold: f32,
}

impl RetrievalEngine {
    /// Embed the knowledge base once and return the ready engine.
    pub fn initialize(
        knowledge_base: KnowledgeBase,
        embedder: Arc<dyn Embedder>,
        threshold: f32,
    ) -> Result<Self, EngineError> {
        let index = RetrievalIndex::build(knowledge_base, embedder.as_ref())?;

        Ok(Self {
            embedder,
            index,
            threshold,
        })
    }

    /// Load the configured fastembed model and knowledge base, then
    /// initialize. `base_path` holds the model cache.
    pub fn from_config(config: &RetrievalConfig, base_path: &Path) -> anyhow::Result<Self> {
        let mut knowledge_base = match &config.knowledge_base {
            Some(path) => KnowledgeBase::load(path)?,
            None => KnowledgeBase::builtin(),
        };
        if let Some(fallback) = &config.fallback_answer {
            knowledge_base = knowledge_base.with_fallback_answer(fallback.clone());
        }

        let timeout = Duration::from_secs(config.download_timeout_secs);
        let model = EmbeddingModel::new(&config.model, base_path.to_path_buf(), Some(timeout))
            .map_err(EngineError::from)?;

        Ok(Self::initialize(
            knowledge_base,
            Arc::new(model),
            config.threshold,
        )?)
    }

    /// Answer `text`, falling back when nothing is confident enough.
    ///
    /// Callers reject blank input beforehand. An embedding failure here is
    /// logged and answered with the fallback rather than surfaced.
    pub fn resolve_query(&self, text: &str) -> Resolution {
        let query = match self.embedder.encode(text) {
            Ok(query) => query,
            Err(err) => {
                log::error!("failed to embed query: {err}");
                return Resolution::fallback(self.index.knowledge_base());
            }
        };

        let best = self.index.best_match(&query);
        log::debug!(
            "query matched entry {:?} with score {:.4}",
            best.entry_index,
            best.score
        );

        let resolution = resolve(best, self.index.knowledge_base(), self.threshold);
        if resolution.is_fallback() {
            log::debug!("no match above threshold {}, answering with fallback", self.threshold);
        }
        resolution
    }

    pub fn is_ready(&self) -> bool {
        !self.index.is_empty()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            ready: self.is_ready(),
            model: self.embedder.name().to_string(),
            dimensions: self.index.dimensions(),
            entries: self.index.len(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn index(&self) -> &RetrievalIndex {
        &self.index
    }
}
