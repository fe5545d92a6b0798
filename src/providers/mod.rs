/*!
 * Model back-ends used by the match scorer.
 *
 * This module contains the two model seams of the aligner and their implementations:
 * - `ollama`: Ollama HTTP client, sentence embeddings and LLM entity extraction
 * - `heuristic`: Offline regex-based entity recognizer
 * - `mock`: Deterministic test doubles
 */

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Named entities found in one text, compared by exact string equality
pub type EntitySet = BTreeSet<String>;

/// Multilingual sentence-embedding model
///
/// Vectors produced for equivalent sentences in different languages must be
/// comparable with cosine similarity.
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    /// Embed a batch of texts
    ///
    /// # Arguments
    /// * `texts` - The texts to embed
    ///
    /// # Returns
    /// * `Result<Vec<Vec<f32>>, ProviderError>` - One vector per input, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Name of the underlying model, for logs and reports
    fn model_name(&self) -> &str;
}

/// Named-entity recognizer for one language
#[async_trait]
pub trait EntityRecognizer: Send + Sync + Debug {
    /// Extract the entity strings of a text
    ///
    /// # Arguments
    /// * `text` - The caption text
    ///
    /// # Returns
    /// * `Result<EntitySet, ProviderError>` - Entity surface strings, possibly empty
    async fn recognize(&self, text: &str) -> Result<EntitySet, ProviderError>;
}

/// Recognizer that never finds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEntityRecognizer;

#[async_trait]
impl EntityRecognizer for NoEntityRecognizer {
    async fn recognize(&self, _text: &str) -> Result<EntitySet, ProviderError> {
        Ok(EntitySet::new())
    }
}

pub mod heuristic;
pub mod mock;
pub mod ollama;
