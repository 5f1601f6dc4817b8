//! The aggregation engine (C5): `resolveOne` and `resolveMany` (§4.5).

use crate::merge::merge_work;
use biblio_gateway_core::models::author::Author;
use biblio_gateway_core::models::edition::Edition;
use biblio_gateway_core::models::work::Work;
use biblio_gateway_core::{GatewayError, Result};
use biblio_gateway_providers::adapter::{Lookup, NormalizedRecord, ProviderAdapter, ProviderError};
use biblio_gateway_providers::cultural_enricher::CulturalKnowledgeBase;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

/// A fully resolved Work with its attached editions and authors.
pub struct ResolvedWork {
    pub work: Work,
    pub editions: Vec<Edition>,
    pub authors: Vec<Author>,
}

/// The result of a `resolveMany` call: flat arrays matching the §6 search
/// response shape.
pub struct ResolvedMany {
    pub works: Vec<Work>,
    pub editions: Vec<Edition>,
    pub authors: Vec<Author>,
}

pub struct ResolveQuery<'a> {
    pub title: Option<&'a str>,
    pub author: Option<&'a str>,
    pub isbn: Option<&'a str>,
}

/// Orchestrates lookups across provider adapters, merging/deduping results
/// and attaching provenance, genre normalization, and cultural enrichment.
pub struct AggregationEngine {
    isbn_primary: Arc<dyn ProviderAdapter>,
    isbn_secondary: Arc<dyn ProviderAdapter>,
    fulltext_primary: Arc<dyn ProviderAdapter>,
    fulltext_secondary: Arc<dyn ProviderAdapter>,
    cultural_kb: Arc<dyn CulturalKnowledgeBase>,
    genre_fuzzy_threshold: f64,
}

impl AggregationEngine {
    pub fn new(
        isbn_primary: Arc<dyn ProviderAdapter>,
        isbn_secondary: Arc<dyn ProviderAdapter>,
        fulltext_primary: Arc<dyn ProviderAdapter>,
        fulltext_secondary: Arc<dyn ProviderAdapter>,
        cultural_kb: Arc<dyn CulturalKnowledgeBase>,
        genre_fuzzy_threshold: f64,
    ) -> Self {
        Self {
            isbn_primary,
            isbn_secondary,
            fulltext_primary,
            fulltext_secondary,
            cultural_kb,
            genre_fuzzy_threshold,
        }
    }

    /// `resolveOne` (§4.5): ISBN lookups consult only the ISBN adapters, in
    /// priority order; title/author lookups build a joined query and
    /// consult the full-text providers, also in priority order.
    pub async fn resolve_one(&self, query: ResolveQuery<'_>) -> Result<Option<ResolvedWork>> {
        if let Some(isbn) = query.isbn {
            return self.resolve_one_by_isbn(isbn).await;
        }
        self.resolve_one_by_text(query.title, query.author).await
    }

    async fn resolve_one_by_isbn(&self, isbn: &str) -> Result<Option<ResolvedWork>> {
        let mut non_retryable: Option<GatewayError> = None;

        for adapter in [&self.isbn_primary, &self.isbn_secondary] {
            match adapter.fetch(Lookup::Isbn(isbn)).await {
                Ok(mut records) if !records.is_empty() => {
                    let primary = single_record_to_resolved(records.remove(0));
                    return Ok(Some(merge_contributions(primary, &records, self.genre_fuzzy_threshold)));
                }
                Ok(_) => continue,
                Err(e) if is_retryable(&e) => continue,
                Err(e) => non_retryable = Some(to_gateway_error(e)),
            }
        }

        match non_retryable {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    async fn resolve_one_by_text(&self, title: Option<&str>, author: Option<&str>) -> Result<Option<ResolvedWork>> {
        let query = [title, author].into_iter().flatten().collect::<Vec<_>>().join(" ");
        let mut non_retryable: Option<GatewayError> = None;

        for adapter in [&self.fulltext_primary, &self.fulltext_secondary] {
            match adapter.fetch(Lookup::Title(&query)).await {
                Ok(mut records) if !records.is_empty() => {
                    let primary = single_record_to_resolved(records.remove(0));
                    return Ok(Some(merge_contributions(primary, &records, self.genre_fuzzy_threshold)));
                }
                Ok(_) => continue,
                Err(e) if is_retryable(&e) => continue,
                Err(e) => non_retryable = Some(to_gateway_error(e)),
            }
        }

        match non_retryable {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// `resolveMany` (§4.5): query the primary full-text provider, fall
    /// through to the secondary on an empty result, attach provenance,
    /// dedupe authors by exact name, and enrich each unique author in
    /// parallel via C3.
    pub async fn resolve_many(&self, query: &str, max_results: usize) -> Result<ResolvedMany> {
        let mut records = match self.fulltext_primary.fetch(Lookup::Title(query)).await {
            Ok(records) => records,
            Err(e) if is_retryable(&e) => Vec::new(),
            Err(e) => return Err(to_gateway_error(e)),
        };

        if records.is_empty() {
            records = match self.fulltext_secondary.fetch(Lookup::Title(query)).await {
                Ok(records) => records,
                Err(e) if is_retryable(&e) => Vec::new(),
                Err(e) => return Err(to_gateway_error(e)),
            };
        }
        records.truncate(max_results);

        let mut works = Vec::with_capacity(records.len());
        let mut editions = Vec::new();
        let mut authors_by_name: HashMap<String, Author> = HashMap::new();

        for mut record in records {
            record.work.synthetic = false;
            works.push(record.work);
            editions.extend(record.editions);
            for author in record.authors {
                authors_by_name.entry(author.name.clone()).or_insert(author);
            }
        }

        let enriched = join_all(authors_by_name.into_values().map(|mut author| {
            let kb = self.cultural_kb.clone();
            async move {
                if let Ok(Some(context)) = kb.lookup(&author.name).await {
                    author.gender = context.gender;
                    author.cultural_region = Some(context.cultural_region);
                    author.nationality = context.nationality;
                    author.birth_year = context.birth_year;
                    author.death_year = context.death_year;
                }
                author
            }
        }))
        .await;

        Ok(ResolvedMany { works, editions, authors: enriched })
    }

    pub fn genre_fuzzy_threshold(&self) -> f64 {
        self.genre_fuzzy_threshold
    }
}

fn is_retryable(error: &ProviderError) -> bool {
    matches!(error, ProviderError::Timeout { .. } | ProviderError::RateLimited { .. } | ProviderError::UpstreamError { .. } | ProviderError::Transport(..))
}

fn to_gateway_error(error: ProviderError) -> GatewayError {
    let provider = error.provider().as_str().to_string();
    match error {
        ProviderError::Timeout { .. } => GatewayError::ProviderTimeout { provider },
        ProviderError::RateLimited { .. } => GatewayError::ProviderUnavailable { provider },
        ProviderError::UpstreamError { .. } => GatewayError::ProviderError {
            provider,
            message: error.to_string(),
            upstream_responded: true,
        },
        ProviderError::AuthFailed { .. } | ProviderError::MalformedResponse { .. } => GatewayError::ProviderError {
            provider,
            message: error.to_string(),
            upstream_responded: true,
        },
        ProviderError::Transport(..) => GatewayError::ProviderUnavailable { provider },
    }
}

fn single_record_to_resolved(record: NormalizedRecord) -> ResolvedWork {
    ResolvedWork { work: record.work, editions: record.editions, authors: record.authors }
}

/// Merge additional normalized records contributing to the same Work —
/// e.g. further matches an adapter returned alongside its best one —
/// applying the §4.5 merge rules in sequence.
pub fn merge_contributions(mut resolved: ResolvedWork, others: &[NormalizedRecord], threshold: f64) -> ResolvedWork {
    for other in others {
        let raw_genres: Vec<String> = other.work.genres.iter().cloned().collect();
        merge_work(&mut resolved.work, &other.work, &raw_genres, threshold);
        resolved.editions.extend(other.editions.clone());
        for author in &other.authors {
            if !resolved.authors.iter().any(|a| a.name == author.name) {
                resolved.authors.push(author.clone());
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failed_is_not_retryable() {
        let err = ProviderError::AuthFailed { provider: biblio_gateway_core::types::ProviderId::Isbndb };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn timeout_is_retryable() {
        let err = ProviderError::Timeout { provider: biblio_gateway_core::types::ProviderId::Isbndb };
        assert!(is_retryable(&err));
    }

    #[test]
    fn non_retryable_error_maps_to_upstream_responded_provider_error() {
        let err = ProviderError::AuthFailed { provider: biblio_gateway_core::types::ProviderId::Isbndb };
        let mapped = to_gateway_error(err);
        match mapped {
            GatewayError::ProviderError { upstream_responded, .. } => assert!(upstream_responded),
            _ => panic!("expected ProviderError"),
        }
    }
}
