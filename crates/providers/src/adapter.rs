//! The provider adapter seam (§4.1): every upstream book-metadata source
//! (ISBNdb, Open Library, Google Books) implements [`ProviderAdapter`] and
//! returns a [`NormalizedRecord`], so the aggregation engine never has to
//! know which provider it is talking to.

use async_trait::async_trait;
use biblio_gateway_core::models::{author::Author, edition::Edition, work::Work};
use biblio_gateway_core::types::ProviderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A provider's view of a book, before it has been merged with any other
/// provider's view by the aggregation engine (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub provider: ProviderId,
    pub work: Work,
    pub editions: Vec<Edition>,
    pub authors: Vec<Author>,
}

/// Errors a provider adapter call can fail with. Distinct from
/// [`biblio_gateway_core::GatewayError`]: this is the adapter's internal
/// failure mode, translated to a `GatewayError::ProviderError` (or
/// `ProviderTimeout`/`ProviderUnavailable`) only once every fallback
/// provider has also failed (§4.5, §7).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request timed out")]
    Timeout { provider: ProviderId },

    #[error("{provider} rate limit exceeded")]
    RateLimited { provider: ProviderId },

    #[error("{provider} responded with an upstream error: {status}")]
    UpstreamError { provider: ProviderId, status: u16 },

    #[error("{provider} authentication failed")]
    AuthFailed { provider: ProviderId },

    #[error("{provider} returned a malformed response: {reason}")]
    MalformedResponse { provider: ProviderId, reason: String },

    #[error("{provider} transport error: {0}")]
    Transport(#[source] reqwest::Error, ProviderId),
}

impl ProviderError {
    pub fn provider(&self) -> ProviderId {
        match self {
            ProviderError::Timeout { provider }
            | ProviderError::RateLimited { provider }
            | ProviderError::UpstreamError { provider, .. }
            | ProviderError::AuthFailed { provider }
            | ProviderError::MalformedResponse { provider, .. } => *provider,
            ProviderError::Transport(_, provider) => *provider,
        }
    }

    /// `true` when the upstream actually sent back a response body, as
    /// opposed to the call failing before one arrived (§7's
    /// `upstream_responded` discriminator).
    pub fn upstream_responded(&self) -> bool {
        matches!(
            self,
            ProviderError::UpstreamError { .. } | ProviderError::MalformedResponse { .. }
        )
    }
}

/// Lookup keys a provider adapter can be queried by.
#[derive(Debug, Clone)]
pub enum Lookup<'a> {
    Isbn(&'a str),
    Title(&'a str),
    Author(&'a str),
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn fetch(&self, lookup: Lookup<'_>) -> Result<Vec<NormalizedRecord>, ProviderError>;
}
