//! Candidate indexing tests against in-memory fakes

mod support;

use screening_worker::db::{Candidate, CandidateId, CandidateProfile};
use screening_worker::indexing::hash_text;
use screening_worker::{build_profile_text, CandidateIndexer, ScreeningError};
use std::sync::Arc;
use support::{profile, FakeEmbedder, MemoryStore};

fn empty_profile(id: &str) -> CandidateProfile {
    CandidateProfile {
        candidate: Candidate {
            id: CandidateId::from(id),
            full_name: "Nobody".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn ids(values: &[&str]) -> Vec<CandidateId> {
    values.iter().map(|v| CandidateId::from(*v)).collect()
}

#[tokio::test]
async fn test_index_candidate_stores_vector() {
    let store = Arc::new(MemoryStore::new());
    let candidate = profile("C1", &["Rust", "PostgreSQL"]);
    let expected_hash = hash_text(&build_profile_text(&candidate));
    store.insert_profile(candidate);
    let embedder = Arc::new(FakeEmbedder::new(8));

    let indexer = CandidateIndexer::new(store.clone(), embedder.clone());
    let indexed = indexer
        .index_candidate(&CandidateId::from("C1"))
        .await
        .unwrap();

    assert_eq!(indexed.dimensions, 8);
    assert_eq!(indexed.source_hash, expected_hash);
    assert_eq!(embedder.calls(), 1);

    let stored = store.embedding("C1").unwrap();
    assert_eq!(stored.dimensions, 8);
    assert_eq!(stored.model, "fake-embedding");
    assert_eq!(stored.source_hash, expected_hash);
    assert_eq!(stored.embedding.as_slice().len(), 8);
}

#[tokio::test]
async fn test_reindexing_overwrites_vector() {
    let store = Arc::new(MemoryStore::new());
    store.insert_profile(profile("C1", &["Rust"]));
    let indexer = CandidateIndexer::new(store.clone(), Arc::new(FakeEmbedder::new(4)));

    let first = indexer.index_candidate(&CandidateId::from("C1")).await.unwrap();
    store.insert_profile(profile("C1", &["Rust", "Kubernetes"]));
    let second = indexer.index_candidate(&CandidateId::from("C1")).await.unwrap();

    assert_ne!(first.source_hash, second.source_hash);
    assert_eq!(store.embedding_count(), 1);
    assert_eq!(store.embedding("C1").unwrap().source_hash, second.source_hash);
}

#[tokio::test]
async fn test_empty_profile_never_calls_embedder() {
    let store = Arc::new(MemoryStore::new());
    store.insert_profile(empty_profile("C0"));
    let embedder = Arc::new(FakeEmbedder::new(8));

    let indexer = CandidateIndexer::new(store.clone(), embedder.clone());
    let err = indexer
        .index_candidate(&CandidateId::from("C0"))
        .await
        .unwrap_err();

    assert!(matches!(err, ScreeningError::EmptyProfile { .. }));
    assert_eq!(embedder.calls(), 0);
    assert!(store.embedding("C0").is_none());
}

#[tokio::test]
async fn test_unknown_candidate_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let indexer = CandidateIndexer::new(store, Arc::new(FakeEmbedder::new(8)));

    let err = indexer
        .index_candidate(&CandidateId::from("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScreeningError::CandidateNotFound { .. }));
}

#[tokio::test]
async fn test_batch_continues_past_failures() {
    let store = Arc::new(MemoryStore::new());
    store.insert_profile(profile("A", &["Rust"]));
    store.insert_profile(profile("B", &["Rust"]));
    store.insert_profile(profile("C", &["Rust"]));
    // B's headline is "Engineer B"
    let embedder = Arc::new(FakeEmbedder::new(8).failing_on("Engineer B"));

    let indexer = CandidateIndexer::new(store.clone(), embedder.clone());
    let report = indexer.index_batch(&ids(&["A", "B", "C"])).await;

    assert_eq!(report.successful, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.successful + report.failed, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, CandidateId::from("B"));
    assert!(report.failures[0].1.contains("503"));

    assert!(store.embedding("A").is_some());
    assert!(store.embedding("B").is_none());
    assert!(store.embedding("C").is_some());
    assert_eq!(embedder.calls(), 3);
}

#[tokio::test]
async fn test_batch_counts_empty_profiles_as_failures() {
    let store = Arc::new(MemoryStore::new());
    store.insert_profile(profile("A", &["Rust"]));
    store.insert_profile(empty_profile("E"));
    let embedder = Arc::new(FakeEmbedder::new(8));

    let indexer = CandidateIndexer::new(store.clone(), embedder.clone());
    let report = indexer.index_batch(&ids(&["A", "E", "missing"])).await;

    assert_eq!(report.successful, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test]
async fn test_index_all_pages_through_candidates() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..7 {
        store.insert_profile(profile(&format!("P{}", i), &["Rust"]));
    }
    let indexer = CandidateIndexer::new(store.clone(), Arc::new(FakeEmbedder::new(4)));

    let report = indexer.index_all(3).await.unwrap();

    assert_eq!(report.successful, 7);
    assert_eq!(report.failed, 0);
    assert_eq!(store.embedding_count(), 7);
}
