//! The results store (C8): write-once, read-many, TTL-bounded storage for
//! the full payload behind a job's `resultsUrl` (§4.8). Backed by Redis —
//! the same durable KV tier the cache's T2 uses — so large arrays never
//! have to travel over the job stream.

use biblio_gateway_core::types::Pipeline;
use redis::AsyncCommands;
use uuid::Uuid;

/// Results are retained 24 hours from job completion.
pub const RESULTS_TTL: chrono::Duration = chrono::Duration::hours(24);
/// Payloads above this size are rejected at write time (§4.8 "~10 MiB").
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ResultsStoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("payload too large: {size} bytes > {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },
    #[error("result already written for key {0}")]
    AlreadyWritten(String),
}

pub struct ResultsStore {
    conn: redis::aio::ConnectionManager,
}

impl ResultsStore {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }

    pub fn key_for(pipeline: Pipeline, job_id: Uuid) -> String {
        format!("{}:{}", pipeline.results_prefix(), job_id)
    }

    /// Write the full job payload. Fails if a value already exists for this
    /// key (write-once) or the payload exceeds [`MAX_PAYLOAD_BYTES`].
    pub async fn write(&self, pipeline: Pipeline, job_id: Uuid, payload: &serde_json::Value) -> Result<(), ResultsStoreError> {
        let key = Self::key_for(pipeline, job_id);
        let mut conn = self.conn.clone();

        let exists: bool = conn.exists(&key).await?;
        if exists {
            return Err(ResultsStoreError::AlreadyWritten(key));
        }

        let serialized = serde_json::to_vec(payload).unwrap_or_default();
        if serialized.len() > MAX_PAYLOAD_BYTES {
            return Err(ResultsStoreError::PayloadTooLarge { size: serialized.len(), max: MAX_PAYLOAD_BYTES });
        }

        let ttl_secs = RESULTS_TTL.num_seconds() as u64;
        let _: () = conn.set_ex(&key, serialized, ttl_secs).await?;
        Ok(())
    }

    /// Read the stored payload. `None` means "not-found" (absent key or
    /// expired past the 24-hour retention) — per §4.8 and §7, this maps to
    /// a 404 at the API boundary, not an error here.
    pub async fn read(&self, pipeline: Pipeline, job_id: Uuid) -> Result<Option<serde_json::Value>, ResultsStoreError> {
        let key = Self::key_for(pipeline, job_id);
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn.get(&key).await?;
        Ok(raw.and_then(|bytes| serde_json::from_slice(&bytes).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_prefixed_by_pipeline_results_prefix() {
        let job_id = Uuid::new_v4();
        let key = ResultsStore::key_for(Pipeline::CsvImport, job_id);
        assert_eq!(key, format!("csv-results:{job_id}"));
    }

    #[test]
    fn different_pipelines_produce_different_prefixes() {
        let job_id = Uuid::new_v4();
        assert_ne!(
            ResultsStore::key_for(Pipeline::BatchEnrichment, job_id),
            ResultsStore::key_for(Pipeline::AiScan, job_id)
        );
    }
}
