//! Audio payload cache keyed by exact synthesized text
//!
//! Lookup is by the exact refined-text string: a hit returns the stored
//! payload without a network call, a miss synthesizes and stores the result.
//! The store is bounded with least-recently-used eviction.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use super::SpeechSynthesizer;
use crate::Result;

/// Fallback capacity if the configured value is zero
const MIN_CAPACITY: usize = 16;

/// Bounded LRU cache of synthesized audio payloads
pub struct AudioCache {
    entries: Mutex<LruCache<String, Arc<Vec<u8>>>>,
}

impl AudioCache {
    /// Create a cache holding at most `capacity` payloads
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(MIN_CAPACITY).expect("nonzero"));
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up the payload for the exact text key
    #[must_use]
    pub fn get(&self, text: &str) -> Option<Arc<Vec<u8>>> {
        self.entries
            .lock()
            .ok()
            .and_then(|mut entries| entries.get(text).cloned())
    }

    /// Store a payload under the exact text key
    pub fn insert(&self, text: String, audio: Arc<Vec<u8>>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(text, audio);
        }
    }

    /// Number of cached payloads
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Synthesizer with an audio cache in front of it
pub struct SpeechService {
    synthesizer: Arc<SpeechSynthesizer>,
    cache: AudioCache,
}

impl SpeechService {
    /// Create a service wrapping the synthesizer with a bounded cache
    #[must_use]
    pub fn new(synthesizer: Arc<SpeechSynthesizer>, cache_capacity: usize) -> Self {
        Self {
            synthesizer,
            cache: AudioCache::new(cache_capacity),
        }
    }

    /// Fetch audio for the given text, serving repeats from the cache
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails on a cache miss
    pub async fn fetch(&self, text: &str) -> Result<Arc<Vec<u8>>> {
        if let Some(audio) = self.cache.get(text) {
            tracing::debug!(text, "audio cache hit");
            return Ok(audio);
        }

        let audio = Arc::new(self.synthesizer.synthesize(text).await?);
        self.cache.insert(text.to_string(), Arc::clone(&audio));
        Ok(audio)
    }

    /// The underlying cache
    #[must_use]
    pub const fn cache(&self) -> &AudioCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_returns_stored_payload() {
        let cache = AudioCache::new(4);
        assert!(cache.get("hello").is_none());

        cache.insert("hello".to_string(), Arc::new(vec![1, 2, 3]));
        assert_eq!(cache.get("hello").unwrap().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn key_is_exact_text() {
        let cache = AudioCache::new(4);
        cache.insert("hello".to_string(), Arc::new(vec![1]));

        assert!(cache.get("Hello").is_none());
        assert!(cache.get("hello ").is_none());
    }

    #[test]
    fn capacity_bound_evicts_least_recently_used() {
        let cache = AudioCache::new(2);
        cache.insert("a".to_string(), Arc::new(vec![1]));
        cache.insert("b".to_string(), Arc::new(vec![2]));

        // Touch "a" so "b" becomes the eviction candidate
        assert!(cache.get("a").is_some());
        cache.insert("c".to_string(), Arc::new(vec![3]));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn zero_capacity_falls_back_to_minimum() {
        let cache = AudioCache::new(0);
        cache.insert("a".to_string(), Arc::new(vec![1]));
        assert!(cache.get("a").is_some());
    }
}
