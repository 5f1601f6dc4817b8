//! T2 (kv): the networked, durable-within-TTL tier shared across processes
//! (§4.4). Backed by Redis; every value is the JSON encoding of a
//! [`CacheEntry`], with Redis's own `EX` expiry as the authoritative TTL
//! (I-5: an entry that survives past its TTL in storage is never returned).

use biblio_gateway_core::models::cache::CacheEntry;
use redis::AsyncCommands;

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("corrupt cache entry for key {0}")]
    Corrupt(String),
}

pub struct KvTier {
    conn: redis::aio::ConnectionManager,
}

impl KvTier {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>, KvError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(json) => {
                let entry = serde_json::from_str(&json).map_err(|_| KvError::Corrupt(key.to_string()))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(entry).map_err(|_| KvError::Corrupt(key.to_string()))?;
        let ttl_secs = entry.ttl.num_seconds().max(1) as u64;
        let _: () = conn.set_ex(key, json, ttl_secs).await?;
        Ok(())
    }

    /// Seconds remaining before Redis expires `key`, if it exists.
    pub async fn ttl_remaining(&self, key: &str) -> Result<Option<i64>, KvError> {
        let mut conn = self.conn.clone();
        let ttl: i64 = conn.ttl(key).await?;
        Ok(if ttl >= 0 { Some(ttl) } else { None })
    }

    pub async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
