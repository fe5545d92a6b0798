/*!
 * Bilingual caption alignment.
 *
 * - `scorer`: Pair scoring from embeddings and entity overlap
 * - `driver`: Time-windowed search for the best target of each source caption
 * - `exclusive`: One-to-one assignment of scored candidates
 * - `similarity`: Vector and entity-set comparisons
 * - `cache`: Per-text caching of model results
 */

use chrono::NaiveTime;
use serde::{Serialize, Serializer};

use crate::app_config::MatchStrategy;
use crate::subtitle_processor::{format_timestamp, Caption};

pub mod cache;
pub mod driver;
pub mod exclusive;
pub mod scorer;
pub mod similarity;

pub use cache::CacheStats;
pub use driver::Aligner;
pub use scorer::{MatchScorer, PairScorer};

/// Accepted correspondence between a source and a target caption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPair {
    pub source_text: String,
    pub target_text: String,

    // @field: Timing of the source caption
    #[serde(serialize_with = "serialize_timestamp")]
    pub start: NaiveTime,
    #[serde(serialize_with = "serialize_timestamp")]
    pub end: NaiveTime,

    // @field: Score as a percentage, one decimal
    pub confidence: f64,
}

impl AlignedPair {
    /// Pair a source caption with its matched target
    pub fn new(source: &Caption, target: &Caption, score: f64) -> Self {
        Self {
            source_text: source.text.clone(),
            target_text: target.text.clone(),
            start: source.start,
            end: source.end,
            confidence: confidence_percent(score),
        }
    }
}

/// Convert a `[0, 1]` score to a percentage rounded to one decimal place
pub fn confidence_percent(score: f64) -> f64 {
    (score * 1000.0).round() / 10.0
}

fn serialize_timestamp<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(*time))
}

/// Components of one pair score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub semantic: f64,
    pub entity_bonus: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn new(semantic: f64, entity_bonus: f64) -> Self {
        Self {
            semantic,
            entity_bonus,
            total: (semantic + entity_bonus).min(1.0),
        }
    }
}

/// Alignment result with run statistics
#[derive(Debug, Clone, Serialize)]
pub struct AlignmentReport {
    pub source_language: String,
    pub target_language: String,
    pub strategy: MatchStrategy,
    pub embedding_model: String,
    pub source_captions: usize,
    pub target_captions: usize,
    pub matched: usize,
    // @field: Source captions left without a match
    pub dropped: usize,
    pub embedding_cache: CacheStats,
    pub pairs: Vec<AlignedPair>,
}

impl AlignmentReport {
    // @returns: Report whose counts are derived from the pairs and track sizes
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        strategy: MatchStrategy,
        embedding_model: impl Into<String>,
        source_captions: usize,
        target_captions: usize,
        embedding_cache: CacheStats,
        pairs: Vec<AlignedPair>,
    ) -> Self {
        let matched = pairs.len();
        Self {
            source_language: source_language.into(),
            target_language: target_language.into(),
            strategy,
            embedding_model: embedding_model.into(),
            source_captions,
            target_captions,
            matched,
            dropped: source_captions.saturating_sub(matched),
            embedding_cache,
            pairs,
        }
    }

    /// Mean confidence of the accepted pairs
    pub fn mean_confidence(&self) -> Option<f64> {
        if self.pairs.is_empty() {
            return None;
        }
        Some(self.pairs.iter().map(|p| p.confidence).sum::<f64>() / self.pairs.len() as f64)
    }
}
