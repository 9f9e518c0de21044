//! Semantic retrieval over a fixed knowledge base.
//!
//! This module answers questions by embedding them with fastembed-rs and
//! picking the knowledge base entry with the highest cosine similarity.
//!
//! # Architecture
//!
//! - `embeddings`: `Embedder` seam and the fastembed wrapper
//! - `index`: Knowledge base + embedding table, exhaustive cosine search
//! - `policy`: Confidence threshold and fallback answer
//! - `engine`: Immutable handle bundling all of the above

pub mod embeddings;
mod engine;
mod index;
mod policy;

pub use embeddings::{Embedder, EmbeddingError, EmbeddingModel};
pub use engine::{EngineError, EngineStatus, RetrievalEngine};
pub use index::{MatchResult, RetrievalIndex};
pub use policy::{resolve, Resolution};

/// Default embedding model name
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Minimum cosine similarity for a match to count as confident (exclusive)
pub const DEFAULT_THRESHOLD: f32 = 0.3;
