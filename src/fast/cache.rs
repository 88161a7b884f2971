// src/fast/cache.rs
// LRU cache for fast translations, owned by the worker

use super::FastTranslator;
use anyhow::Result;
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

/// Default number of cached (text, language) pairs
pub const DEFAULT_CACHE_CAPACITY: usize = 20;

/// Bounded cache of fast results keyed by `(text, language code)`.
///
/// Empty text never reaches the provider and is never cached.
pub struct FastTranslationCache {
    cache: LruCache<(String, String), String>,
    hits: u64,
    misses: u64,
}

impl FastTranslationCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Translate through the cache
    pub async fn translate(
        &mut self,
        provider: &dyn FastTranslator,
        text: &str,
        language_code: &str,
    ) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let key = (text.to_string(), language_code.to_string());
        if let Some(hit) = self.cache.get(&key) {
            self.hits += 1;
            debug!(language = language_code, hits = self.hits, "Fast translation cache hit");
            return Ok(hit.clone());
        }

        self.misses += 1;
        let translated = provider.translate(text, language_code).await?;
        // Only successes reach the cache
        self.cache.put(key, translated.clone());
        Ok(translated)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

impl Default for FastTranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
