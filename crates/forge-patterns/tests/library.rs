//! Pattern library behaviour through the public API

use chrono::{Duration, Utc};
use forge_artifact::{ExamplePattern, PatternEvolution};
use forge_patterns::{
    LibrarySnapshot, PatternError, PatternFeedback, PatternLibrary, PatternLibraryConfig,
    SearchCriteria, SnapshotEntry,
};
use forge_test_utils::{init_tracing, sample_patterns};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn library() -> PatternLibrary {
    init_tracing();
    PatternLibrary::with_patterns(PatternLibraryConfig::default(), sample_patterns()).unwrap()
}

fn stale_entry(id: &str, description: &str, usage: u64) -> SnapshotEntry {
    let mut evolution = PatternEvolution::new(Utc::now() - Duration::days(60));
    evolution.usage_count = usage;
    SnapshotEntry {
        pattern: ExamplePattern::new(id, id, description, "web"),
        evolution: Some(evolution),
    }
}

#[tokio::test]
async fn api_query_prefers_rest_pattern() {
    let library = library();
    let criteria = SearchCriteria::default()
        .with_max_examples(1)
        .with_min_similarity(0.2);

    let matches = library.find_similar("build an api", &criteria).await;

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].pattern.id, "rest-endpoint");
    assert!((matches[0].similarity - 0.25).abs() < 1e-9);
}

#[tokio::test]
async fn results_are_ranked_and_capped() {
    let library = library();
    let criteria = SearchCriteria::default().with_min_similarity(0.1).with_max_examples(2);

    let matches = library.find_similar("api endpoint query", &criteria).await;

    assert!(matches.len() <= 2);
    assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(matches.iter().all(|m| m.similarity >= 0.1));
}

#[tokio::test]
async fn cached_hits_do_not_count_as_usage() {
    let library = library();
    let criteria = SearchCriteria::default().with_min_similarity(0.2);

    let first = library.find_similar("build an api", &criteria).await;
    let second = library.find_similar("build an api", &criteria).await;

    assert_eq!(first, second);
    assert_eq!(library.evolution("rest-endpoint").unwrap().usage_count, 1);
    assert_eq!(library.get_pattern("rest-endpoint").unwrap().metadata.usage_count, 1);
}

#[tokio::test]
async fn learning_can_be_disabled() {
    let library = PatternLibrary::with_patterns(
        PatternLibraryConfig::default().with_learning(false),
        sample_patterns(),
    )
    .unwrap();
    let criteria = SearchCriteria::default().with_min_similarity(0.2);
    library.find_similar("build an api", &criteria).await;
    assert_eq!(library.evolution("rest-endpoint").unwrap().usage_count, 0);

    let before = library.evolution("rest-endpoint");
    library
        .record_feedback("rest-endpoint", PatternFeedback::success(0.9))
        .unwrap();
    assert_eq!(library.evolution("rest-endpoint"), before);
}

#[test]
fn feedback_for_unknown_id_fails_with_or_without_learning() {
    for learning in [true, false] {
        let library = PatternLibrary::with_patterns(
            PatternLibraryConfig::default().with_learning(learning),
            sample_patterns(),
        )
        .unwrap();
        let err = library
            .record_feedback("missing", PatternFeedback::success(0.5))
            .unwrap_err();
        assert!(matches!(err, PatternError::NotFound(ref id) if id == "missing"), "{err}");
    }
}

#[tokio::test]
async fn mutation_invalidates_cached_results() {
    let library = library();
    let criteria = SearchCriteria::default().with_min_similarity(0.2);
    let before = library.find_similar("stream event processing", &criteria).await;
    assert!(before.is_empty());

    library
        .add_pattern(ExamplePattern::new(
            "events",
            "Event stream",
            "event stream processing pipeline",
            "data",
        ))
        .unwrap();

    let after = library.find_similar("stream event processing", &criteria).await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].pattern.id, "events");

    library.remove_pattern("events").unwrap();
    assert!(library.find_similar("stream event processing", &criteria).await.is_empty());
}

#[tokio::test]
async fn filters_narrow_candidates() {
    let library = library();
    let criteria = SearchCriteria::default()
        .with_min_similarity(0.1)
        .with_domain("data");

    let matches = library.find_similar("api query optimization", &criteria).await;

    assert!(!matches.is_empty());
    assert!(matches.iter().all(|m| m.pattern.metadata.domain == "data"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_searches_share_one_computation() {
    let library = Arc::new(library());
    let criteria = SearchCriteria::default().with_min_similarity(0.2);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let library = Arc::clone(&library);
            let criteria = criteria.clone();
            tokio::spawn(async move { library.find_similar("build an api", &criteria).await })
        })
        .collect();

    let results = collect_results(handles).await;
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(library.evolution("rest-endpoint").unwrap().usage_count, 1);
}

async fn collect_results<T>(handles: Vec<tokio::task::JoinHandle<T>>) -> Vec<T> {
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.unwrap());
    }
    out
}

#[test]
fn full_library_without_cleanup_rejects() {
    let config = PatternLibraryConfig::default()
        .with_max_patterns(2)
        .with_auto_cleanup(false);
    let library = PatternLibrary::new(config);
    library.add_pattern(ExamplePattern::new("a", "A", "alpha service", "web")).unwrap();
    library.add_pattern(ExamplePattern::new("b", "B", "beta worker", "web")).unwrap();

    let err = library
        .add_pattern(ExamplePattern::new("c", "C", "gamma queue", "web"))
        .unwrap_err();
    assert_eq!(err, PatternError::CapacityExceeded { max: 2 });
}

#[test]
fn full_library_evicts_only_stale_low_usage() {
    let library = PatternLibrary::new(PatternLibraryConfig::default().with_max_patterns(2));
    library
        .import_snapshot(LibrarySnapshot::new(vec![
            stale_entry("old-unused", "legacy cron scheduler", 1),
            stale_entry("old-popular", "legacy payment gateway", 50),
        ]))
        .unwrap();

    library
        .add_pattern(ExamplePattern::new("new", "New", "fresh websocket relay", "web"))
        .unwrap();

    assert!(library.get_pattern("old-unused").is_none());
    assert!(library.get_pattern("old-popular").is_some());
    assert!(library.get_pattern("new").is_some());

    // nothing else is stale
    let err = library
        .add_pattern(ExamplePattern::new("next", "Next", "another grpc bridge", "web"))
        .unwrap_err();
    assert!(err.is_capacity());
}

#[test]
fn explicit_cleanup_reports_evictions() {
    let library = PatternLibrary::default();
    library
        .import_snapshot(LibrarySnapshot::new(vec![
            stale_entry("a", "legacy cron scheduler", 0),
            stale_entry("b", "legacy payment gateway", 9),
        ]))
        .unwrap();
    let generation = library.generation();

    assert_eq!(library.cleanup(), 1);
    assert_eq!(library.len(), 1);
    assert!(library.generation() > generation);
    assert_eq!(library.cleanup(), 0);
}

#[test]
fn snapshot_round_trip_preserves_learning() {
    let source = library();
    source
        .record_feedback("rest-endpoint", PatternFeedback::success(0.9))
        .unwrap();
    let json = source.export_snapshot().to_json().unwrap();

    let target = PatternLibrary::default();
    let count = target.import_snapshot(LibrarySnapshot::from_json(&json).unwrap()).unwrap();

    assert_eq!(count, source.len());
    assert_eq!(target.patterns(), source.patterns());
    let (before, after) = (
        source.evolution("rest-endpoint").unwrap(),
        target.evolution("rest-endpoint").unwrap(),
    );
    assert_eq!(after.feedback_count, before.feedback_count);
    assert_eq!(after.success_rate, before.success_rate);
    assert!((after.feedback_score - before.feedback_score).abs() < 1e-12);
}

#[test]
fn import_rejects_oversized_snapshot() {
    let library = PatternLibrary::new(PatternLibraryConfig::default().with_max_patterns(1));
    let result = library.import_snapshot(LibrarySnapshot::new(vec![
        stale_entry("a", "one thing", 0),
        stale_entry("b", "other thing", 0),
    ]));
    assert!(matches!(result, Err(PatternError::InvalidSnapshot(_))));
    assert!(library.is_empty());
}

#[test]
fn analytics_reflect_store() {
    let library = library();
    let analytics = library.analytics();
    assert_eq!(analytics.total_patterns, library.len());
    assert_eq!(
        analytics.domain_coverage.values().sum::<usize>(),
        library.len()
    );
}
