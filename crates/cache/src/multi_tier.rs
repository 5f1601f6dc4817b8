//! The multi-tier cache orchestrator (C4): the read path (T1 → T2 →
//! cold-index probe → MISS) and the write path (concurrent T1 + T2 +
//! cold-index-in-T2, per-tier failure isolation) of §4.4.

use crate::tiers::cold::ColdTier;
use crate::tiers::edge::EdgeCache;
use crate::tiers::kv::KvTier;
use crate::ttl;
use biblio_gateway_core::models::cache::CacheEntry;
use biblio_gateway_core::types::{CacheTier, EndpointKind};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

/// Outcome of a [`MultiTierCache::read`] call. `tier` always reflects which
/// tier actually served the caller (I-6), never where the entry originated.
pub struct ReadOutcome {
    pub tier: CacheTier,
    pub payload: Option<serde_json::Value>,
}

pub struct MultiTierCache {
    edge: Arc<EdgeCache>,
    kv: Arc<KvTier>,
    cold: Arc<ColdTier>,
}

impl MultiTierCache {
    pub fn new(edge: Arc<EdgeCache>, kv: Arc<KvTier>, cold: Arc<ColdTier>) -> Self {
        Self { edge, kv, cold }
    }

    /// Read path for cache key `key` (§4.4 steps 1-4). Step 2's T1 backfill
    /// and step 3's rehydration are spawned as detached background tasks —
    /// the caller never waits on them.
    pub async fn read(&self, key: &str) -> ReadOutcome {
        if let Some(entry) = self.edge.get(key).await {
            if !entry.is_expired(Utc::now()) {
                return ReadOutcome { tier: CacheTier::T1, payload: Some(entry.payload) };
            }
        }

        match self.kv.get(key).await {
            Ok(Some(entry)) if !entry.is_expired(Utc::now()) => {
                self.spawn_t1_backfill(key.to_string(), entry.clone());
                return ReadOutcome { tier: CacheTier::T2, payload: Some(entry.payload) };
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, key, "T2 read failed, falling through to cold probe"),
        }

        match self.cold.probe(key).await {
            Ok(Some(index_entry)) => {
                self.spawn_rehydration(index_entry);
                return ReadOutcome { tier: CacheTier::Cold, payload: None };
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, key, "cold-index probe failed"),
        }

        ReadOutcome { tier: CacheTier::Miss, payload: None }
    }

    /// Write path (§4.4): populate T1, T2, and the cold index concurrently.
    /// A failure in any one tier is logged and does not abort the others.
    pub async fn write(&self, key: &str, endpoint_kind: EndpointKind, payload: serde_json::Value, quality_score: u8) {
        let now = Utc::now();
        let ttl = ttl::ttl_for(endpoint_kind, quality_score);
        let entry = CacheEntry::new(key.to_string(), payload.clone(), now, ttl, CacheTier::T1);

        let edge = self.edge.clone();
        let kv = self.kv.clone();
        let cold = self.cold.clone();
        let key_owned = key.to_string();
        let entry_for_t1 = entry.clone();
        let entry_for_t2 = entry.clone();

        let t1 = async move { edge.insert(key_owned, entry_for_t1).await };
        let t2_key = key.to_string();
        let t2 = async move {
            if let Err(e) = kv.set(&t2_key, &entry_for_t2).await {
                warn!(error = %e, key = t2_key, "T2 write failed");
            }
        };
        let cold_key = key.to_string();
        let payload_bytes = serde_json::to_vec(&payload).unwrap_or_default();
        let cold_write = async move {
            if let Err(e) = cold.archive(&cold_key, endpoint_kind, &payload_bytes, now).await {
                warn!(error = %e, key = cold_key, "cold-index write failed");
            }
        };

        tokio::join!(t1, t2, cold_write);
    }

    fn spawn_t1_backfill(&self, key: String, entry: CacheEntry) {
        let edge = self.edge.clone();
        let remaining = entry.ttl;
        let mut mirrored = entry;
        mirrored.ttl = ttl::t1_mirror_ttl(remaining);
        tokio::spawn(async move {
            edge.insert(key, mirrored).await;
        });
    }

    fn spawn_rehydration(&self, index_entry: biblio_gateway_core::models::cache::ColdIndexEntry) {
        let cold = self.cold.clone();
        let kv = self.kv.clone();
        let edge = self.edge.clone();
        tokio::spawn(async move {
            match cold.rehydrate(&index_entry).await {
                Ok(bytes) => {
                    let payload: serde_json::Value = match serde_json::from_slice(&bytes) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!(error = %e, key = index_entry.cache_key, "rehydrated payload was not valid JSON");
                            return;
                        }
                    };
                    let now = Utc::now();
                    let t2_entry = CacheEntry::new(
                        index_entry.cache_key.clone(),
                        payload.clone(),
                        now,
                        chrono::Duration::days(7),
                        CacheTier::T2,
                    );
                    if let Err(e) = kv.set(&index_entry.cache_key, &t2_entry).await {
                        warn!(error = %e, key = index_entry.cache_key, "rehydration T2 restore failed");
                    }
                    let t1_entry = CacheEntry::new(
                        index_entry.cache_key.clone(),
                        payload,
                        now,
                        chrono::Duration::hours(6),
                        CacheTier::T1,
                    );
                    edge.insert(index_entry.cache_key.clone(), t1_entry).await;
                }
                Err(e) => warn!(error = %e, key = index_entry.cache_key, "cold rehydration failed"),
            }
        });
    }
}
