use std::sync::Arc;

use super::{BagOfWordsEmbedder, BrokenEmbedder, FixedEmbedder};
use crate::knowledge::{KnowledgeBase, KnowledgeEntry, FALLBACK_ANSWER};
use crate::semantic::{
    EmbeddingModel, EngineError, MatchResult, RetrievalEngine, RetrievalIndex, DEFAULT_THRESHOLD,
};

fn builtin_engine() -> RetrievalEngine {
    RetrievalEngine::initialize(
        KnowledgeBase::builtin(),
        Arc::new(BagOfWordsEmbedder::new(256)),
        DEFAULT_THRESHOLD,
    )
    .unwrap()
}

fn axis_engine(threshold: f32) -> RetrievalEngine {
    let kb = KnowledgeBase::new(vec![
        KnowledgeEntry::new("first", "first answer"),
        KnowledgeEntry::new("second", "second answer"),
    ]);
    let embedder = FixedEmbedder::new(
        vec![
            ("first", vec![1.0, 0.0, 0.0, 0.0]),
            ("second", vec![0.0, 0.0, 0.0, 1.0]),
            // cos with "first" is exactly 3 / 10
            ("boundary", vec![3.0, 9.0, 3.0, 1.0]),
            // a hair above 3 / 10
            ("above", vec![3.001, 9.0, 3.0, 1.0]),
        ],
        vec![0.0; 4],
    );
    RetrievalEngine::initialize(kb, Arc::new(embedder), threshold).unwrap()
}

#[test]
fn test_self_match_for_every_builtin_entry() {
    let engine = builtin_engine();

    for entry in KnowledgeBase::builtin().entries() {
        let resolution = engine.resolve_query(&entry.question);
        assert_eq!(resolution.answer, entry.answer, "question: {}", entry.question);
        assert!(
            (resolution.confidence - 1.0).abs() < 1e-5,
            "confidence {} for {}",
            resolution.confidence,
            entry.question
        );
    }
}

#[test]
fn test_resolution_is_deterministic() {
    let engine = builtin_engine();
    let query = "How can I keep a healthy work-life balance?";

    let first = engine.resolve_query(query);
    for _ in 0..10 {
        assert_eq!(engine.resolve_query(query), first);
    }

    // a second engine over the same inputs agrees too
    assert_eq!(builtin_engine().resolve_query(query), first);
}

#[test]
fn test_similarity_exactly_at_threshold_falls_back() {
    let engine = axis_engine(0.3);

    let best = engine.index().best_match(&[3.0, 9.0, 3.0, 1.0]);
    assert_eq!(best.entry_index, Some(0));
    assert_eq!(best.score, 0.3);

    let resolution = engine.resolve_query("boundary");
    assert_eq!(resolution.answer, FALLBACK_ANSWER);
    assert_eq!(resolution.confidence, 0.0);
}

#[test]
fn test_similarity_just_above_threshold_matches() {
    let engine = axis_engine(0.3);

    let best = engine.index().best_match(&[3.001, 9.0, 3.0, 1.0]);
    assert_eq!(best.entry_index, Some(0));
    assert!(best.score > 0.3 && best.score < 0.3001, "score {}", best.score);

    let resolution = engine.resolve_query("above");
    assert_eq!(resolution.answer, "first answer");
    assert_eq!(resolution.confidence, best.score);
}

#[test]
fn test_lowered_threshold_accepts_boundary_score() {
    let engine = axis_engine(0.29999);
    let resolution = engine.resolve_query("boundary");
    assert_eq!(resolution.answer, "first answer");
    assert_eq!(resolution.confidence, 0.3);
}

#[test]
fn test_zero_magnitude_query_falls_back() {
    let engine = axis_engine(DEFAULT_THRESHOLD);
    let resolution = engine.resolve_query("anything unknown");

    assert_eq!(resolution.answer, FALLBACK_ANSWER);
    assert_eq!(resolution.confidence, 0.0);
    assert!(!resolution.confidence.is_nan());
}

#[test]
fn test_zero_magnitude_query_falls_back_under_negative_threshold() {
    let engine = axis_engine(-0.5);
    let resolution = engine.resolve_query("anything unknown");

    assert_eq!(resolution.answer, FALLBACK_ANSWER);
    assert_eq!(resolution.entry_index, None);

    // real matches are unaffected
    let resolution = engine.resolve_query("second");
    assert_eq!(resolution.answer, "second answer");
}

#[test]
fn test_duplicate_questions_resolve_to_lower_index() {
    let kb = KnowledgeBase::new(vec![
        KnowledgeEntry::new("unrelated topic", "unrelated"),
        KnowledgeEntry::new("How do I focus?", "earlier copy"),
        KnowledgeEntry::new("How do I focus?", "later copy"),
    ]);
    let engine =
        RetrievalEngine::initialize(kb, Arc::new(BagOfWordsEmbedder::new(64)), DEFAULT_THRESHOLD)
            .unwrap();

    for _ in 0..5 {
        let resolution = engine.resolve_query("How do I focus?");
        assert_eq!(resolution.answer, "earlier copy");
        assert_eq!(resolution.entry_index, Some(1));
    }
}

#[test]
fn test_empty_knowledge_base_fails_to_initialize() {
    let result = RetrievalEngine::initialize(
        KnowledgeBase::new(vec![]),
        Arc::new(BagOfWordsEmbedder::new(8)),
        DEFAULT_THRESHOLD,
    );
    assert!(matches!(result, Err(EngineError::EmptyKnowledgeBase)));
}

#[test]
fn test_empty_table_matches_none() {
    let index = RetrievalIndex::from_parts(KnowledgeBase::new(vec![]), vec![]).unwrap();
    assert_eq!(index.best_match(&[0.5, 0.5]), MatchResult::NONE);
    assert_eq!(index.best_match(&[0.5, 0.5]).entry_index, None);
}

#[test]
fn test_broken_model_is_model_unavailable() {
    let result = RetrievalEngine::initialize(
        KnowledgeBase::builtin(),
        Arc::new(BrokenEmbedder),
        DEFAULT_THRESHOLD,
    );
    assert!(matches!(result, Err(EngineError::ModelUnavailable(_))));
}

#[test]
fn test_knowledge_base_file_feeds_engine() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("kb.yaml");
    std::fs::write(
        &path,
        "- question: Where is the office?\n  answer: Second floor.\n- question: When is lunch?\n  answer: At noon.\n",
    )
    .unwrap();

    let kb = KnowledgeBase::load(&path).unwrap();
    let engine =
        RetrievalEngine::initialize(kb, Arc::new(BagOfWordsEmbedder::new(64)), DEFAULT_THRESHOLD)
            .unwrap();

    assert_eq!(engine.resolve_query("When is lunch?").answer, "At noon.");
    assert_eq!(engine.status().entries, 2);
}

// =============================================================================
// Real model
// =============================================================================

fn model_engine() -> (RetrievalEngine, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let model = EmbeddingModel::new("all-MiniLM-L6-v2", tmp.path().to_path_buf(), None)
        .expect("Failed to initialize embedding model");
    let engine =
        RetrievalEngine::initialize(KnowledgeBase::builtin(), Arc::new(model), DEFAULT_THRESHOLD)
            .unwrap();
    (engine, tmp)
}

#[test]
#[ignore = "requires model download (~23MB)"]
fn test_prioritize_question_finds_eisenhower_matrix() {
    let (engine, _tmp) = model_engine();

    let resolution = engine.resolve_query("How should I prioritize my work?");
    assert!(resolution.answer.starts_with("Use the Eisenhower Matrix"));
    assert!(resolution.confidence > 0.3);
}

#[test]
#[ignore = "requires model download (~23MB)"]
fn test_out_of_domain_question_falls_back() {
    let (engine, _tmp) = model_engine();

    let resolution = engine.resolve_query("What is the capital of France?");
    assert_eq!(resolution.answer, FALLBACK_ANSWER);
    assert_eq!(resolution.confidence, 0.0);
}

#[test]
#[ignore = "requires model download (~23MB)"]
fn test_model_self_match() {
    let (engine, _tmp) = model_engine();

    for entry in KnowledgeBase::builtin().entries() {
        let resolution = engine.resolve_query(&entry.question);
        assert_eq!(resolution.answer, entry.answer);
        assert!((resolution.confidence - 1.0).abs() < 1e-3);
    }
}
