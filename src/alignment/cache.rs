/*!
 * Per-text caching of model results.
 *
 * Caption texts repeat a lot within a track ("Yes.", "Thank you."), so
 * embeddings and entity sets are computed once per unique text.
 */

use std::collections::HashMap;
use parking_lot::RwLock;
use log::debug;
use serde::Serialize;

/// Hit and miss counts of a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Thread-safe cache keyed by caption text
pub struct TextCache<V: Clone> {
    /// Internal cache storage
    cache: RwLock<HashMap<String, V>>,

    /// Cache hit counter
    hits: RwLock<usize>,

    /// Cache miss counter
    misses: RwLock<usize>,

    /// Label used in debug logs
    name: &'static str,
}

impl<V: Clone> TextCache<V> {
    /// Create a new, empty cache
    pub fn new(name: &'static str) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            hits: RwLock::new(0),
            misses: RwLock::new(0),
            name,
        }
    }

    /// Look a text up, counting the hit or miss
    pub fn get(&self, text: &str) -> Option<V> {
        let cache = self.cache.read();

        match cache.get(text) {
            Some(value) => {
                *self.hits.write() += 1;
                debug!("{} cache hit for '{}'", self.name, truncate_text(text, 30));
                Some(value.clone())
            }
            None => {
                *self.misses.write() += 1;
                debug!("{} cache miss for '{}'", self.name, truncate_text(text, 30));
                None
            }
        }
    }

    /// Store a value for a text
    pub fn store(&self, text: &str, value: V) {
        self.cache.write().insert(text.to_string(), value);
    }

    /// Unique texts, in first-seen order, that are not cached yet
    pub fn missing<'a, I>(&self, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cache = self.cache.read();
        let mut seen = std::collections::HashSet::new();

        texts
            .into_iter()
            .filter(|text| !cache.contains_key(*text) && seen.insert(*text))
            .map(str::to_string)
            .collect()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: *self.hits.read(),
            misses: *self.misses.read(),
        }
    }

    fn len(&self) -> usize {
        self.cache.read().len()
    }
}

impl<V: Clone> std::fmt::Debug for TextCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCache")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
