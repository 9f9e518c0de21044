//! Embedder seam and the fastembed-backed implementation.
//!
//! - `Embedder` is the contract the retrieval index depends on
//! - `EmbeddingModel` loads a sentence-transformer through fastembed once,
//!   at construction, and reuses it for every later call

use fastembed::{InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::time::Duration;

/// Default download timeout for model files (5 minutes)
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Maps text to fixed-dimension dense vectors.
///
/// Implementations must be deterministic for a given model: the same text
/// always yields the same (or numerically equivalent) vector, and
/// `encode_all` yields exactly what per-item `encode` calls would, in input
/// order.
pub trait Embedder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn encode_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    /// Dimensionality of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Model identifier, for logs and health reporting.
    fn name(&self) -> &str;
}

/// Wrapper around fastembed's TextEmbedding model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct EmbeddingModel {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Model download timed out after {0} seconds")]
    DownloadTimeout(u64),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),
}

impl EmbeddingModel {
    /// Load the named model, downloading it into `cache_dir/models` on first
    /// use. This is the slow step of startup and must run exactly once.
    pub fn new(
        model_name: &str,
        cache_dir: PathBuf,
        download_timeout: Option<Duration>,
    ) -> Result<Self, EmbeddingError> {
        let model_enum = Self::parse_model_name(model_name)?;
        let timeout = download_timeout.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT);

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        log::info!("Loading embedding model '{}'", model_name);
        let started = std::time::Instant::now();

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(true);

        let (model, dimensions) = load_with_deadline(timeout, move || {
            let mut model = TextEmbedding::try_new(options)
                .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;
            let dimensions = Self::probe_dimensions(&mut model)?;
            Ok((model, dimensions))
        })?;

        log::info!(
            "Embedding model '{}' loaded in {:.1}s ({} dimensions)",
            model_name,
            started.elapsed().as_secs_f32(),
            dimensions
        );

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    /// Parse model name string to fastembed enum.
    fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
        match name.to_lowercase().as_str() {
            "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l6-v2-q" | "allminiml6v2q" => {
                Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q)
            }
            "bge-small-en-v1.5" | "bgesmallenv15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
            "bge-small-en-v1.5-q" | "bgesmallenv15q" => {
                Ok(fastembed::EmbeddingModel::BGESmallENV15Q)
            }
            "bge-base-en-v1.5" | "bgebaseenv15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
            "bge-base-en-v1.5-q" | "bgebaseenv15q" => {
                Ok(fastembed::EmbeddingModel::BGEBaseENV15Q)
            }
            _ => Err(EmbeddingError::InvalidModel(format!(
                "Unknown model: {}. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5 (add -q suffix for quantized)",
                name
            ))),
        }
    }

    /// Probe the model to determine embedding dimensions.
    fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
        let test_embeddings = model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::InitFailed(format!("Failed to probe dimensions: {}", e)))?;

        test_embeddings
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::InitFailed("Model returned no embedding".to_string()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, TextEmbedding>, EmbeddingError> {
        self.model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })
    }
}

/// Run `load` on its own thread, giving up once `timeout` has passed.
///
/// fastembed cannot cancel a download in flight, so on timeout the loader
/// thread is left to finish in the background and its result is dropped.
fn load_with_deadline<T, F>(timeout: Duration, load: F) -> Result<T, EmbeddingError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EmbeddingError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        // receiver is gone after a timeout
        let _ = tx.send(load());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(EmbeddingError::DownloadTimeout(timeout.as_secs())),
        Err(RecvTimeoutError::Disconnected) => Err(EmbeddingError::InitFailed(
            "model loader thread panicked".to_string(),
        )),
    }
}

impl Embedder for EmbeddingModel {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embeddings = self
            .lock()?
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding returned".to_string()))
    }

    fn encode_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        self.lock()?
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
