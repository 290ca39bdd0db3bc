//! Caching module for deepsearch-rs
//!
//! Caches successful engine responses so repeated or unrefined queries do
//! not hit the backend again within the TTL.

use crate::results::Hit;
use moka::future::Cache;
use std::time::Duration;

/// Cache for engine hits, keyed by engine, query and count
pub struct HitCache {
    cache: Cache<String, Vec<Hit>>,
}

impl HitCache {
    /// Create a new hit cache with specified TTL
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        Self { cache }
    }

    /// Get cached hits
    pub async fn get(&self, key: &str) -> Option<Vec<Hit>> {
        self.cache.get(key).await
    }

    /// Store hits in cache
    pub async fn set(&self, key: String, hits: Vec<Hit>) {
        self.cache.insert(key, hits).await;
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Get cache size
    pub fn size(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for HitCache {
    fn default() -> Self {
        Self::new(300, 1000) // 5 minutes TTL, 1k max entries
    }
}

/// Generate a cache key for one engine call
pub fn query_cache_key(engine: &str, query: &str, count: usize) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(engine.as_bytes());
    hasher.update([0u8]);
    hasher.update(query.trim().to_lowercase().as_bytes());
    hasher.update([0u8]);
    hasher.update(count.to_string().as_bytes());

    format!("{:x}", hasher.finalize())
}
