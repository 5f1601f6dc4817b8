//! Fixtures shared by the integration suites: in-memory stand-ins for
//! provider adapters and the cultural knowledge base, so the aggregation
//! engine (C5) can be exercised without a live network or Redis.

use async_trait::async_trait;
use biblio_gateway_core::models::{author::Author, edition::Edition, edition::IsbnSet, work::Provenance, work::Work};
use biblio_gateway_core::types::{Format, ProviderId, ReviewStatus};
use biblio_gateway_providers::adapter::{Lookup, NormalizedRecord, ProviderAdapter, ProviderError};
use biblio_gateway_providers::cultural_enricher::{CulturalContext, CulturalEnrichmentError, CulturalKnowledgeBase};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A scripted adapter: returns one fixed outcome (possibly a failure) per
/// call and counts how many times it was invoked.
pub struct ScriptedAdapter {
    pub id: ProviderId,
    outcome: ScriptedOutcome,
    calls: AtomicUsize,
}

pub enum ScriptedOutcome {
    Records(Vec<NormalizedRecord>),
    Empty,
    Fail(fn(ProviderId) -> ProviderError),
}

impl ScriptedAdapter {
    pub fn new(id: ProviderId, outcome: ScriptedOutcome) -> Self {
        Self { id, outcome, calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn fetch(&self, _lookup: Lookup<'_>) -> Result<Vec<NormalizedRecord>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            ScriptedOutcome::Records(records) => Ok(records.clone()),
            ScriptedOutcome::Empty => Ok(Vec::new()),
            ScriptedOutcome::Fail(make_err) => Err(make_err(self.id)),
        }
    }
}

/// Builds a single-work [`NormalizedRecord`] fixture attributed to
/// `provider`, with one edition carrying `isbns` and one author.
pub fn fixture_record(provider: ProviderId, title: &str, isbns: &[&str], author: &str) -> NormalizedRecord {
    let mut isbn_set = IsbnSet::new();
    for isbn in isbns {
        isbn_set.insert_canonicalizing(isbn);
    }

    NormalizedRecord {
        provider,
        work: Work {
            title: title.to_string(),
            genres: Default::default(),
            provenance: Provenance::single(provider.as_str()),
            review_status: ReviewStatus::Verified,
            quality_score: 80,
            synthetic: false,
            original_language: None,
            first_publication_year: None,
            description: None,
            cover_url: None,
            external_ids: Default::default(),
            last_sync: None,
            detection_bounding_box: None,
        },
        editions: vec![Edition {
            isbn_set,
            format: Format::Hardcover,
            quality_score: 80,
            publisher: None,
            publication_date: None,
            page_count: None,
            cover_url: None,
            edition_title: None,
            edition_description: None,
            language: None,
            external_ids: Default::default(),
        }],
        authors: vec![Author::new(author)],
    }
}

/// A cultural knowledge base stand-in: returns a fixed context for known
/// names, `Ok(None)` otherwise, and can be told to fail for a specific name
/// to exercise §4.5's "no other author is penalized" rule.
pub struct ScriptedCulturalKb {
    pub fail_for: Option<&'static str>,
}

#[async_trait]
impl CulturalKnowledgeBase for ScriptedCulturalKb {
    async fn lookup(&self, author_name: &str) -> Result<Option<CulturalContext>, CulturalEnrichmentError> {
        if self.fail_for == Some(author_name) {
            return Err(CulturalEnrichmentError::Timeout);
        }
        Ok(Some(CulturalContext {
            gender: biblio_gateway_core::types::Gender::Unknown,
            cultural_region: biblio_gateway_core::types::CulturalRegion::WesternEurope,
            nationality: Some("British".to_string()),
            birth_year: None,
            death_year: None,
        }))
    }
}
