//! T3 (cold): an index stored in T2 under a `cold-index:` prefix that
//! points at an object in a blob archive, with background rehydration
//! (§4.4 step 3). The cold tier never holds payload bytes directly in
//! memory, only the [`ColdIndexEntry`] pointer.

use crate::tiers::kv::{KvError, KvTier};
use biblio_gateway_core::models::cache::ColdIndexEntry;
use biblio_gateway_core::types::EndpointKind;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::{path::Path as ObjectPath, ObjectStore};
use std::sync::Arc;

const COLD_INDEX_PREFIX: &str = "cold-index";
/// Cold-index entries are retained 90 days regardless of the endpoint
/// kind's own TTL (§3 lifecycles).
pub const COLD_INDEX_RETENTION: chrono::Duration = chrono::Duration::days(90);

#[derive(Debug, thiserror::Error)]
pub enum ColdTierError {
    #[error(transparent)]
    Kv(#[from] KvError),
    #[error("archive store error: {0}")]
    Archive(#[from] object_store::Error),
}

fn cold_index_key(original_key: &str) -> String {
    format!("{COLD_INDEX_PREFIX}:{original_key}")
}

pub struct ColdTier {
    kv: Arc<KvTier>,
    archive: Arc<dyn ObjectStore>,
}

impl ColdTier {
    pub fn new(kv: Arc<KvTier>, archive: Arc<dyn ObjectStore>) -> Self {
        Self { kv, archive }
    }

    /// Probe `cold-index:{original_key}`. A hit means the payload has been
    /// archived and can be rehydrated; the caller must schedule
    /// [`Self::rehydrate`] as a background task and respond with tier=COLD,
    /// data=null immediately (§4.4 step 3 — never wait for rehydration).
    pub async fn probe(&self, original_key: &str) -> Result<Option<ColdIndexEntry>, ColdTierError> {
        let raw = self.kv.get(&cold_index_key(original_key)).await?;
        Ok(raw.and_then(|entry| serde_json::from_value(entry.payload).ok()))
    }

    /// Archive a payload: write it to the blob store at its deterministic
    /// path, then write the pointer into T2 under the cold-index key.
    pub async fn archive(
        &self,
        original_key: &str,
        endpoint_kind: EndpointKind,
        payload: &[u8],
        created_at: DateTime<Utc>,
    ) -> Result<ColdIndexEntry, ColdTierError> {
        let archive_path = ColdIndexEntry::archive_path_for(created_at, original_key);
        self.archive
            .put(&ObjectPath::from(archive_path.clone()), Bytes::from(payload.to_vec()).into())
            .await?;

        let index_entry = ColdIndexEntry {
            cache_key: original_key.to_string(),
            archive_path,
            created_at,
            payload_size: payload.len() as u64,
            endpoint_kind,
        };

        let wrapper = biblio_gateway_core::models::cache::CacheEntry::new(
            cold_index_key(original_key),
            serde_json::to_value(&index_entry).unwrap_or(serde_json::Value::Null),
            created_at,
            COLD_INDEX_RETENTION,
            biblio_gateway_core::types::CacheTier::Cold,
        );
        self.kv.set(&cold_index_key(original_key), &wrapper).await?;
        Ok(index_entry)
    }

    /// Fetch the archived payload and delete the cold-index pointer. The
    /// caller is responsible for restoring the result into T1/T2 (§4.4).
    pub async fn rehydrate(&self, index_entry: &ColdIndexEntry) -> Result<Vec<u8>, ColdTierError> {
        let result = self.archive.get(&ObjectPath::from(index_entry.archive_path.clone())).await?;
        let bytes = result.bytes().await?;
        self.kv.delete(&cold_index_key(&index_entry.cache_key)).await?;
        Ok(bytes.to_vec())
    }
}
