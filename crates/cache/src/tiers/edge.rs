//! T1 (edge): in-process, sub-10ms, bounded-capacity, volatile (§4.4).

use biblio_gateway_core::models::cache::CacheEntry;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration as StdDuration, Instant};

struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &CacheEntry, _created_at: Instant) -> Option<StdDuration> {
        value.ttl.to_std().ok()
    }
}

/// A bounded, volatile mirror of hot entries. Last-writer-wins under
/// concurrent inserts for the same key (§5 "shared resources and policy").
pub struct EdgeCache {
    inner: Cache<String, CacheEntry>,
}

impl EdgeCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, entry: CacheEntry) {
        self.inner.insert(key, entry).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
