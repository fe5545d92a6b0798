/*!
 * Deterministic model doubles for testing.
 *
 * - `StubEmbedder` returns fixed vectors from a lookup table
 * - `StubEntityRecognizer` returns fixed entity sets from a lookup table
 *
 * Both can be switched to a failing mode and count the work they are given.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{Embedder, EntityRecognizer, EntitySet};

/// Embedder backed by a text -> vector table
///
/// Unknown texts embed to the zero vector, which has similarity 0 with everything.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
    failing: bool,
    // @field: Number of embed calls
    call_count: Arc<AtomicUsize>,
    // @field: Number of texts across all calls
    text_count: Arc<AtomicUsize>,
}

impl StubEmbedder {
    /// Create an embedder producing vectors of the given size
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: HashMap::new(),
            failing: false,
            call_count: Arc::new(AtomicUsize::new(0)),
            text_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create an embedder whose every call fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(2)
        }
    }

    /// Register the vector returned for a text
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    /// Register two texts whose vectors have the given cosine similarity
    pub fn with_pair(self, left: impl Into<String>, right: impl Into<String>, similarity: f32) -> Self {
        let mut left_vector = vec![0.0; self.dimensions.max(2)];
        left_vector[0] = 1.0;
        let mut right_vector = vec![0.0; self.dimensions.max(2)];
        right_vector[0] = similarity;
        right_vector[1] = (1.0 - similarity * similarity).max(0.0).sqrt();

        self.with_vector(left, left_vector).with_vector(right, right_vector)
    }

    /// Number of embed calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of texts embedded so far
    pub fn text_count(&self) -> usize {
        self.text_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.text_count.fetch_add(texts.len(), Ordering::SeqCst);

        if self.failing {
            return Err(ProviderError::ConnectionError("Stub embedder failure".to_string()));
        }

        Ok(texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.dimensions.max(2)])
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "stub-embedder"
    }
}

/// Entity recognizer backed by a text -> entities table
#[derive(Debug, Clone, Default)]
pub struct StubEntityRecognizer {
    entities: HashMap<String, EntitySet>,
    failing: bool,
    call_count: Arc<AtomicUsize>,
}

impl StubEntityRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recognizer whose every call fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Register the entities returned for a text
    pub fn with_entities(mut self, text: impl Into<String>, entities: &[&str]) -> Self {
        self.entities
            .insert(text.into(), entities.iter().map(|e| e.to_string()).collect());
        self
    }

    /// Number of recognize calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityRecognizer for StubEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<EntitySet, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.failing {
            return Err(ProviderError::RequestFailed("Stub recognizer failure".to_string()));
        }

        Ok(self.entities.get(text).cloned().unwrap_or_default())
    }
}
