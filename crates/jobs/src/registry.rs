//! The job registry: tracks one [`JobHandle`] per jobId for the duration
//! of its lifecycle (created on async-endpoint entry, destroyed at
//! terminal state + archive, or 24h since creation with no stream
//! activity — §3 lifecycles).

use crate::job::JobHandle;
use biblio_gateway_core::types::Pipeline;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

struct Entry {
    handle: Arc<JobHandle>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<Uuid, Entry>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, pipeline: Pipeline) -> Arc<JobHandle> {
        let handle = JobHandle::new(pipeline);
        let id = handle.id().await;
        self.jobs.insert(id, Entry { handle: handle.clone(), created_at: Utc::now() });
        handle
    }

    pub fn get(&self, job_id: Uuid) -> Option<Arc<JobHandle>> {
        self.jobs.get(&job_id).map(|e| e.handle.clone())
    }

    pub fn remove(&self, job_id: Uuid) {
        self.jobs.remove(&job_id);
    }

    /// Sweep jobs older than 24 hours with no stream activity (§3
    /// lifecycle: destroyed at terminal state + archive, OR 24h since
    /// creation with no stream activity).
    pub fn sweep_expired(&self) {
        let cutoff = Utc::now() - chrono::Duration::hours(24);
        self.jobs.retain(|_, entry| entry.created_at > cutoff);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_job_is_retrievable_by_id() {
        let registry = JobRegistry::new();
        let handle = registry.create(Pipeline::AiScan).await;
        let id = handle.id().await;
        assert!(registry.get(id).is_some());
    }

    #[tokio::test]
    async fn removed_job_is_no_longer_retrievable() {
        let registry = JobRegistry::new();
        let handle = registry.create(Pipeline::CsvImport).await;
        let id = handle.id().await;
        registry.remove(id);
        assert!(registry.get(id).is_none());
    }

    #[tokio::test]
    async fn unknown_id_returns_none() {
        let registry = JobRegistry::new();
        assert!(registry.get(Uuid::new_v4()).is_none());
    }
}
