//! Memoizes OCR output per uploaded image.
//!
//! The interaction model re-sends the same image for every follow-up action
//! (pick a language, ask a question), so extractions are keyed by a digest of
//! the upload bytes and reused instead of re-running the engine.

use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::engine::Extraction;

/// Entry cap. When reached the whole map is dropped; at this size recomputing
/// a handful of extractions is cheaper than tracking recency.
const MAX_ENTRIES: usize = 128;

pub type CacheKey = [u8; 32];

#[derive(Default)]
pub struct ExtractionCache {
    entries: Mutex<HashMap<CacheKey, Extraction>>,
}

impl ExtractionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest of the raw upload bytes.
    pub fn key(data: &[u8]) -> CacheKey {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().into()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Extraction> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, extraction: Extraction) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= MAX_ENTRIES {
            entries.clear();
        }
        entries.insert(key, extraction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction(text: &str) -> Extraction {
        Extraction {
            text: text.to_string(),
            confidence: 0.9,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn same_bytes_hit_the_cache() {
        let cache = ExtractionCache::new();
        let key = ExtractionCache::key(b"image bytes");

        assert!(cache.get(&key).is_none());
        cache.insert(key, extraction("Hello World"));

        let hit = cache.get(&key).unwrap();
        assert_eq!(hit.text, "Hello World");
    }

    #[test]
    fn different_bytes_are_different_keys() {
        let a = ExtractionCache::key(b"image one");
        let b = ExtractionCache::key(b"image two");
        assert_ne!(a, b);
    }

    #[test]
    fn cap_clears_and_keeps_accepting() {
        let cache = ExtractionCache::new();
        for i in 0..MAX_ENTRIES {
            cache.insert(ExtractionCache::key(&i.to_le_bytes()), extraction("x"));
        }

        let key = ExtractionCache::key(b"one more");
        cache.insert(key, extraction("fresh"));
        assert_eq!(cache.get(&key).unwrap().text, "fresh");
    }
}
