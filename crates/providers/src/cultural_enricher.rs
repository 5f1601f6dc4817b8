//! Author cultural-context enrichment (C3).
//!
//! Looks an author up against a knowledge-base lookup to fill in
//! `cultural_region` / `nationality`. Both positive and negative results
//! (the KB was reachable but had nothing on this author) are cached for
//! 7 days, since the KB's content changes rarely. A KB *failure* (timeout,
//! 5xx) is never cached — the next lookup should retry rather than
//! remember a transient outage as "no data" (§4.3).

use biblio_gateway_core::types::{CulturalRegion, Gender};
use chrono::Duration;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NEGATIVE_RESULT_TTL: Duration = Duration::days(7);
const CACHE_KEY_PREFIX: &str = "cultural-context:";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CulturalContext {
    #[serde(default)]
    pub gender: Gender,
    pub cultural_region: CulturalRegion,
    pub nationality: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
}

#[derive(Debug, Error)]
pub enum CulturalEnrichmentError {
    #[error("cultural knowledge base timed out")]
    Timeout,
    #[error("cultural knowledge base returned an error: {0}")]
    UpstreamError(String),
}

#[async_trait::async_trait]
pub trait CulturalKnowledgeBase: Send + Sync {
    /// `Ok(None)` is a confirmed negative (the KB has no entry for this
    /// author) and is cacheable. `Err` is a transient failure and must not
    /// be cached (§4.3).
    async fn lookup(&self, author_name: &str) -> Result<Option<CulturalContext>, CulturalEnrichmentError>;
}

/// A lookup outcome worth caching, including the "we checked and there was
/// nothing" case. KB failures short-circuit before a [`CachedLookup`] is
/// ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedLookup {
    pub context: Option<CulturalContext>,
    pub cached_at: chrono::DateTime<chrono::Utc>,
}

impl CachedLookup {
    pub fn new(context: Option<CulturalContext>, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self { context, cached_at: now }
    }

    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now >= self.cached_at + NEGATIVE_RESULT_TTL
    }
}

/// Derive a [`CulturalRegion`] from a free-text nationality/citizenship
/// label by matching against a fixed table of country-name patterns
/// (§4.3). Unmatched labels fall back to [`CulturalRegion::Other`].
pub fn region_from_nationality(label: &str) -> CulturalRegion {
    let lower = label.to_lowercase();
    const PATTERNS: &[(&[&str], CulturalRegion)] = &[
        (
            &["united states", "american", "canada", "canadian"],
            CulturalRegion::NorthAmerica,
        ),
        (
            &["mexic", "brazil", "argentin", "chile", "colombia", "peru", "cuba", "venezuel"],
            CulturalRegion::LatinAmerica,
        ),
        (
            &["british", "england", "english", "french", "france", "german", "spain", "spanish", "italy", "italian", "dutch", "irish", "scottish", "portugal", "portuguese"],
            CulturalRegion::WesternEurope,
        ),
        (
            &["russia", "polish", "poland", "ukrain", "czech", "hungar", "romania", "serbia", "bulgaria"],
            CulturalRegion::EasternEurope,
        ),
        (
            &["nigeria", "kenya", "ghana", "ethiopia", "south africa", "senegal", "zimbabwe", "uganda", "tanzania"],
            CulturalRegion::SubSaharanAfrica,
        ),
        (
            &["egypt", "saudi", "iran", "iranian", "iraq", "israel", "turkish", "turkey", "lebanon", "morocc", "jordan", "syria"],
            CulturalRegion::MiddleEastNorthAfrica,
        ),
        (
            &["india", "indian", "pakistan", "bangladesh", "sri lanka", "nepal"],
            CulturalRegion::SouthAsia,
        ),
        (
            &["china", "chinese", "japan", "japanese", "korea", "korean", "taiwan"],
            CulturalRegion::EastAsia,
        ),
        (
            &["vietnam", "thailand", "thai", "indonesia", "philippin", "malaysia", "singapore", "cambodia"],
            CulturalRegion::SoutheastAsia,
        ),
        (
            &["australia", "new zealand", "new zealander"],
            CulturalRegion::Oceania,
        ),
    ];

    for (needles, region) in PATTERNS {
        if needles.iter().any(|n| lower.contains(n)) {
            return *region;
        }
    }
    CulturalRegion::Other
}

#[derive(Debug, Deserialize, Default)]
struct EntitySearchResponse {
    #[serde(default)]
    results: Vec<EntityMatch>,
}

#[derive(Debug, Deserialize)]
struct EntityMatch {
    gender: Option<String>,
    /// An opaque entity id for the citizenship country, not yet a
    /// human-readable label — resolved via a second request.
    citizenship: Option<String>,
    birth_year: Option<i32>,
    death_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct EntityLabelResponse {
    label: String,
}

/// An HTTP-backed knowledge-base lookup (§4.3): searches for the best
/// matching entity by name, then resolves the citizenship field to a
/// human-readable label via a second request before deriving the
/// cultural region from it.
pub struct HttpCulturalKnowledgeBase {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCulturalKnowledgeBase {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait::async_trait]
impl CulturalKnowledgeBase for HttpCulturalKnowledgeBase {
    async fn lookup(&self, author_name: &str) -> Result<Option<CulturalContext>, CulturalEnrichmentError> {
        let url = format!("{}/entities/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("name", author_name)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CulturalEnrichmentError::Timeout
                } else {
                    CulturalEnrichmentError::UpstreamError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(CulturalEnrichmentError::UpstreamError(format!("status {}", response.status())));
        }

        let body: EntitySearchResponse = response
            .json()
            .await
            .map_err(|e| CulturalEnrichmentError::UpstreamError(e.to_string()))?;

        let best = match body.results.into_iter().next() {
            Some(m) => m,
            None => return Ok(None),
        };

        let nationality = match best.citizenship {
            Some(id) => Some(self.resolve_entity_label(&id).await?),
            None => None,
        };
        let cultural_region = nationality.as_deref().map(region_from_nationality).unwrap_or(CulturalRegion::Other);
        let gender = best.gender.as_deref().map(Gender::from_label).unwrap_or_default();

        Ok(Some(CulturalContext {
            gender,
            cultural_region,
            nationality,
            birth_year: best.birth_year,
            death_year: best.death_year,
        }))
    }
}

impl HttpCulturalKnowledgeBase {
    /// Resolves an opaque citizenship entity id to its human-readable
    /// label (§4.3's "second lookup").
    async fn resolve_entity_label(&self, entity_id: &str) -> Result<String, CulturalEnrichmentError> {
        let url = format!("{}/entities/{}", self.base_url, entity_id);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                CulturalEnrichmentError::Timeout
            } else {
                CulturalEnrichmentError::UpstreamError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(CulturalEnrichmentError::UpstreamError(format!("status {}", response.status())));
        }

        let body: EntityLabelResponse = response.json().await.map_err(|e| CulturalEnrichmentError::UpstreamError(e.to_string()))?;
        Ok(body.label)
    }
}

/// Wraps an inner [`CulturalKnowledgeBase`] with a Redis-backed 7-day
/// cache, including negative results. A KB failure propagates without
/// ever being written to the cache (§4.3).
pub struct CachingCulturalKnowledgeBase {
    inner: std::sync::Arc<dyn CulturalKnowledgeBase>,
    redis: redis::aio::ConnectionManager,
}

impl CachingCulturalKnowledgeBase {
    pub fn new(inner: std::sync::Arc<dyn CulturalKnowledgeBase>, redis: redis::aio::ConnectionManager) -> Self {
        Self { inner, redis }
    }

    fn cache_key(author_name: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{}", author_name.trim().to_lowercase())
    }
}

#[async_trait::async_trait]
impl CulturalKnowledgeBase for CachingCulturalKnowledgeBase {
    async fn lookup(&self, author_name: &str) -> Result<Option<CulturalContext>, CulturalEnrichmentError> {
        let key = Self::cache_key(author_name);
        let mut conn = self.redis.clone();

        let cached: Option<String> = conn.get(&key).await.unwrap_or(None);
        if let Some(raw) = cached {
            if let Ok(cached_lookup) = serde_json::from_str::<CachedLookup>(&raw) {
                if !cached_lookup.is_expired(chrono::Utc::now()) {
                    return Ok(cached_lookup.context);
                }
            }
        }

        let result = self.inner.lookup(author_name).await?;

        let cached_lookup = CachedLookup::new(result.clone(), chrono::Utc::now());
        if let Ok(json) = serde_json::to_string(&cached_lookup) {
            let ttl_secs = NEGATIVE_RESULT_TTL.num_seconds().max(1) as u64;
            let _: Result<(), redis::RedisError> = conn.set_ex(&key, json, ttl_secs).await;
        }

        Ok(result)
    }
}
