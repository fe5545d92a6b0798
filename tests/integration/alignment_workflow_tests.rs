/*!
 * Integration tests for aligning SRT text end to end
 */

use std::sync::Arc;
use subalign::alignment::{Aligner, MatchScorer};
use subalign::app_config::{AlignmentConfig, MatchStrategy};
use subalign::errors::{AlignError, TrackRole};
use subalign::providers::heuristic::HeuristicEntityRecognizer;
use subalign::providers::mock::StubEmbedder;
use subalign::providers::NoEntityRecognizer;
use crate::common;

fn semantic_only_aligner(embedder: StubEmbedder) -> Aligner<MatchScorer> {
    let scorer = MatchScorer::new(Arc::new(embedder), Arc::new(NoEntityRecognizer), Arc::new(NoEntityRecognizer));
    Aligner::new(scorer)
}

/// One caption each, half a second apart, 0.9 similar: one pair at 90.0
#[tokio::test]
async fn test_align_withCloseSimilarCaptions_shouldMatchAtNinety() {
    let source = common::srt_block(1, "00:00:01,000", "00:00:02,000", "Hello");
    let target = common::srt_block(1, "00:00:01,500", "00:00:02,500", "你好");
    let aligner = semantic_only_aligner(StubEmbedder::new(2).with_pair("Hello", "你好", 0.9));

    let pairs = aligner.align(&source, &target).await.unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].source_text, "Hello");
    assert_eq!(pairs[0].target_text, "你好");
    assert_eq!(pairs[0].confidence, 90.0);
}

/// The same captions four seconds apart never meet
#[tokio::test]
async fn test_align_withDistantCaptions_shouldMatchNothing() {
    let source = common::srt_block(1, "00:00:01,000", "00:00:02,000", "Hello");
    let target = common::srt_block(1, "00:00:05,000", "00:00:06,000", "你好");
    let embedder = StubEmbedder::new(2).with_pair("Hello", "你好", 0.9);
    let counter = embedder.clone();
    let aligner = semantic_only_aligner(embedder);

    let pairs = aligner.align(&source, &target).await.unwrap();
    assert!(pairs.is_empty());
    // Both texts are still embedded up front
    assert_eq!(counter.text_count(), 2);
}

/// The sample tracks: a strong pair, an entity-boosted pair, an orphan
#[tokio::test]
async fn test_align_withSampleTracks_shouldUseEntityBonus() {
    let (embedder, source, target) = common::sample_models();
    let aligner = Aligner::new(MatchScorer::new(embedder, source, target));

    let pairs = aligner.align(common::ENGLISH_TRACK, common::CHINESE_TRACK).await.unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].confidence, 90.0);
    assert_eq!(pairs[1].target_text, "巴黎在哪里？");
    assert_eq!(pairs[1].confidence, 80.0);
}

/// Without the entity bonus the weaker pair falls under the threshold
#[tokio::test]
async fn test_align_withoutEntityBonus_shouldDropWeakPair() {
    let (embedder, source, target) = common::sample_models();
    let config = AlignmentConfig {
        entity_bonus: 0.0,
        ..AlignmentConfig::default()
    };
    let scorer = MatchScorer::from_config(&config, embedder, source, target);
    let aligner = Aligner::from_config(scorer, &config);

    let pairs = aligner.align(common::ENGLISH_TRACK, common::CHINESE_TRACK).await.unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].source_text, "Good morning.");
}

/// Offline recognizers and exclusive matching work together
#[tokio::test]
async fn test_align_withHeuristicEntitiesAndExclusive_shouldPairOneToOne() {
    let source = [
        common::srt_block(1, "00:00:01,000", "00:00:02,000", "Flight 714 is boarding."),
        common::srt_block(2, "00:00:02,000", "00:00:03,000", "Gate 12."),
    ]
    .concat();
    let target = [
        common::srt_block(1, "00:00:01,200", "00:00:02,000", "714航班正在登机。"),
        common::srt_block(2, "00:00:02,100", "00:00:03,000", "12号登机口。"),
    ]
    .concat();

    let embedder = StubEmbedder::new(3)
        .with_vector("Flight 714 is boarding.", vec![1.0, 0.0, 0.0])
        .with_vector("Gate 12.", vec![0.0, 1.0, 0.0])
        .with_vector("714航班正在登机。", vec![0.7, 0.7141, 0.0])
        .with_vector("12号登机口。", vec![0.5, 0.5, 0.7071]);
    let scorer = MatchScorer::new(
        Arc::new(embedder),
        Arc::new(HeuristicEntityRecognizer::for_language("en")),
        Arc::new(HeuristicEntityRecognizer::for_language("zh")),
    );
    let aligner = Aligner::new(scorer).with_strategy(MatchStrategy::Exclusive);

    // Greedy would give the 714 line to both sources
    let pairs = aligner.align(&source, &target).await.unwrap();
    let matched: Vec<(&str, &str)> = pairs
        .iter()
        .map(|p| (p.source_text.as_str(), p.target_text.as_str()))
        .collect();
    assert_eq!(
        matched,
        vec![("Flight 714 is boarding.", "714航班正在登机。"), ("Gate 12.", "12号登机口。")]
    );
    assert_eq!(pairs[0].confidence, 90.0);
}

/// A malformed source track is reported as such
#[tokio::test]
async fn test_align_withBrokenSourceTrack_shouldReportSource() {
    let aligner = semantic_only_aligner(StubEmbedder::new(2));
    let source = "1\n00:00:01,000 --> nonsense\nHello\n";

    let result = aligner.align(source, common::CHINESE_TRACK).await;
    assert!(matches!(result, Err(AlignError::Parse { track: TrackRole::Source, .. })));
}

/// A failing embedding model aborts the call
#[tokio::test]
async fn test_align_withFailingEmbedder_shouldFail() {
    let aligner = semantic_only_aligner(StubEmbedder::failing());

    let result = aligner.align(common::ENGLISH_TRACK, common::CHINESE_TRACK).await;
    assert!(matches!(result, Err(AlignError::Scoring(_))));
}

/// Alignment can be driven from a spawned task
#[tokio::test]
async fn test_align_onSpawnedTask_shouldComplete() {
    let (embedder, source, target) = common::sample_models();
    let aligner = Aligner::new(MatchScorer::new(embedder, source, target)).with_concurrency(3);

    let handle = tokio::spawn(async move { aligner.align(common::ENGLISH_TRACK, common::CHINESE_TRACK).await });

    let pairs = handle.await.unwrap().unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[1].confidence, 80.0);
}
