//! Wraps a [`ProviderAdapter`] so every call first clears the per-provider
//! rate gate (§4.1). Keeps the pacing concern out of each adapter's own
//! `fetch` implementation.

use crate::adapter::{Lookup, NormalizedRecord, ProviderAdapter, ProviderError};
use crate::rate_gate::RateGate;
use async_trait::async_trait;
use biblio_gateway_core::types::ProviderId;
use std::sync::Arc;

pub struct GatedAdapter<A> {
    inner: A,
    gate: Arc<RateGate>,
}

impl<A: ProviderAdapter> GatedAdapter<A> {
    pub fn new(inner: A, gate: Arc<RateGate>) -> Self {
        Self { inner, gate }
    }
}

#[async_trait]
impl<A: ProviderAdapter> ProviderAdapter for GatedAdapter<A> {
    fn id(&self) -> ProviderId {
        self.inner.id()
    }

    async fn fetch(&self, lookup: Lookup<'_>) -> Result<Vec<NormalizedRecord>, ProviderError> {
        let id = self.inner.id();
        if self.gate.acquire(id).await.is_err() {
            tracing::warn!(provider = %id, "rate gate redis error, proceeding without distributed pacing");
        }
        self.inner.fetch(lookup).await
    }
}
