/*!
 * Caption pair scoring.
 *
 * A pair's score is the cosine similarity of the two texts' multilingual
 * embeddings, plus a fixed bonus when both texts name a common entity,
 * capped at 1.0.
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, trace};
use std::collections::HashSet;
use std::sync::Arc;

use crate::app_config::AlignmentConfig;
use crate::errors::ScoringError;
use crate::providers::{Embedder, EntityRecognizer, EntitySet};
use crate::subtitle_processor::Caption;

use super::cache::{CacheStats, TextCache};
use super::similarity::{cosine_similarity, entities_overlap};
use super::ScoreBreakdown;

/// Scores how well a source text corresponds to a target text
#[async_trait]
pub trait PairScorer: Send + Sync {
    /// Warm up before a batch of `score` calls over these tracks
    async fn prepare(&self, _sources: &[Caption], _targets: &[Caption]) -> Result<(), ScoringError> {
        Ok(())
    }

    /// Score a pair, in `[0, 1]`
    async fn score(&self, source_text: &str, target_text: &str) -> Result<f64, ScoringError>;
}

/// Embedding similarity plus entity-overlap bonus
#[derive(Debug)]
pub struct MatchScorer {
    embedder: Arc<dyn Embedder>,
    source_recognizer: Arc<dyn EntityRecognizer>,
    target_recognizer: Arc<dyn EntityRecognizer>,
    entity_bonus: f64,
    batch_size: usize,
    concurrency: usize,
    embeddings: TextCache<Arc<Vec<f32>>>,
    source_entities: TextCache<Arc<EntitySet>>,
    target_entities: TextCache<Arc<EntitySet>>,
}

impl MatchScorer {
    /// Create a scorer with the default bonus and batching
    pub fn new(
        embedder: Arc<dyn Embedder>,
        source_recognizer: Arc<dyn EntityRecognizer>,
        target_recognizer: Arc<dyn EntityRecognizer>,
    ) -> Self {
        Self::from_config(&AlignmentConfig::default(), embedder, source_recognizer, target_recognizer)
    }

    /// Create a scorer using the bonus and batching settings of a config
    pub fn from_config(
        config: &AlignmentConfig,
        embedder: Arc<dyn Embedder>,
        source_recognizer: Arc<dyn EntityRecognizer>,
        target_recognizer: Arc<dyn EntityRecognizer>,
    ) -> Self {
        Self {
            embedder,
            source_recognizer,
            target_recognizer,
            entity_bonus: config.entity_bonus,
            batch_size: config.embedding_batch_size.max(1),
            concurrency: config.concurrent_requests.max(1),
            embeddings: TextCache::new("Embedding"),
            source_entities: TextCache::new("Source entity"),
            target_entities: TextCache::new("Target entity"),
        }
    }

    /// Set the bonus added on entity overlap
    pub fn with_entity_bonus(mut self, entity_bonus: f64) -> Self {
        self.entity_bonus = entity_bonus;
        self
    }

    /// Set the number of texts per embedding request
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Name of the embedding model
    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embedding cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.embeddings.stats()
    }

    /// Score a pair and report how the score was built
    pub async fn breakdown(&self, source_text: &str, target_text: &str) -> Result<ScoreBreakdown, ScoringError> {
        let source_vector = self.embedding(source_text).await?;
        let target_vector = self.embedding(target_text).await?;
        let semantic = cosine_similarity(&source_vector, &target_vector)?;

        let source_entities =
            entities_of(&*self.source_recognizer, &self.source_entities, source_text).await?;
        let target_entities =
            entities_of(&*self.target_recognizer, &self.target_entities, target_text).await?;
        let bonus = if entities_overlap(&source_entities, &target_entities) {
            self.entity_bonus
        } else {
            0.0
        };

        let breakdown = ScoreBreakdown::new(semantic, bonus);
        trace!(
            "Scored '{}' / '{}': semantic {:.4} + bonus {:.2} = {:.4}",
            source_text, target_text, breakdown.semantic, breakdown.entity_bonus, breakdown.total
        );

        Ok(breakdown)
    }

    async fn embedding(&self, text: &str) -> Result<Arc<Vec<f32>>, ScoringError> {
        if let Some(vector) = self.embeddings.get(text) {
            return Ok(vector);
        }

        let owned = [text.to_string()];
        self.embed_chunk(&owned)
            .await?
            .pop()
            .ok_or(ScoringError::BatchSizeMismatch { expected: 1, received: 0 })
    }

    // Embed texts in one request and cache the vectors
    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Arc<Vec<f32>>>, ScoringError> {
        let vectors = self.embedder.embed(chunk).await?;
        if vectors.len() != chunk.len() {
            return Err(ScoringError::BatchSizeMismatch {
                expected: chunk.len(),
                received: vectors.len(),
            });
        }

        Ok(chunk
            .iter()
            .zip(vectors)
            .map(|(text, vector)| {
                let vector = Arc::new(vector);
                self.embeddings.store(text, vector.clone());
                vector
            })
            .collect())
    }

    async fn prepare_entities(
        &self,
        recognizer: &dyn EntityRecognizer,
        cache: &TextCache<Arc<EntitySet>>,
        captions: &[Caption],
    ) -> Result<(), ScoringError> {
        let missing = cache.missing(captions.iter().map(|c| c.text.as_str()));

        // Built up front so the stream holds no borrowing closure
        let requests: Vec<_> = missing
            .iter()
            .map(|text| async move {
                let entities = recognizer.recognize(text).await?;
                cache.store(text, Arc::new(entities));
                Ok::<(), ScoringError>(())
            })
            .collect();

        stream::iter(requests)
            .buffer_unordered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(())
    }
}

async fn entities_of(
    recognizer: &dyn EntityRecognizer,
    cache: &TextCache<Arc<EntitySet>>,
    text: &str,
) -> Result<Arc<EntitySet>, ScoringError> {
    if let Some(entities) = cache.get(text) {
        return Ok(entities);
    }

    let entities = Arc::new(recognizer.recognize(text).await?);
    cache.store(text, entities.clone());
    Ok(entities)
}

#[async_trait]
impl PairScorer for MatchScorer {
    async fn prepare(&self, sources: &[Caption], targets: &[Caption]) -> Result<(), ScoringError> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = sources
            .iter()
            .chain(targets)
            .map(|c| c.text.as_str())
            .filter(|text| seen.insert(*text))
            .collect();
        let missing = self.embeddings.missing(unique);

        debug!(
            "Embedding {} unique text(s) with {} in batches of {}",
            missing.len(),
            self.embedder.model_name(),
            self.batch_size
        );

        let requests: Vec<_> = missing.chunks(self.batch_size).map(|chunk| self.embed_chunk(chunk)).collect();

        stream::iter(requests)
            .buffer_unordered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await?;

        self.prepare_entities(&*self.source_recognizer, &self.source_entities, sources).await?;
        self.prepare_entities(&*self.target_recognizer, &self.target_entities, targets).await?;

        Ok(())
    }

    async fn score(&self, source_text: &str, target_text: &str) -> Result<f64, ScoringError> {
        Ok(self.breakdown(source_text, target_text).await?.total)
    }
}
