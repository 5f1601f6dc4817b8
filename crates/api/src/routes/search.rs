//! ISBN, title, and advanced search (§6, C5 `resolveOne`/`resolveMany`).

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use biblio_gateway_aggregation::engine::ResolveQuery;
use biblio_gateway_cache::key_factory;
use biblio_gateway_core::envelope::Envelope;
use biblio_gateway_core::models::author::Author;
use biblio_gateway_core::models::edition::Edition;
use biblio_gateway_core::models::work::Work;
use biblio_gateway_core::sanitization::sanitize_search_query;
use biblio_gateway_core::types::EndpointKind;
use biblio_gateway_core::{validation, GatewayError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone)]
struct SearchResult {
    works: Vec<Work>,
    editions: Vec<Edition>,
    authors: Vec<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
}

impl SearchResult {
    fn empty() -> Self {
        Self { works: Vec::new(), editions: Vec::new(), authors: Vec::new(), provider: None }
    }
}

async fn read_or_resolve(
    state: &AppState,
    kind: EndpointKind,
    key: &str,
    resolve: impl std::future::Future<Output = Result<SearchResult, GatewayError>>,
) -> Result<(SearchResult, bool, &'static str), GatewayError> {
    let outcome = state.cache.read(key).await;
    if let Some(payload) = outcome.payload {
        if let Ok(cached) = serde_json::from_value::<SearchResult>(payload) {
            return Ok((cached, true, "HIT"));
        }
    }

    let result = resolve.await?;
    let quality = data_quality_score(&result);
    state.cache.write(key, kind, serde_json::to_value(&result).unwrap_or_default(), quality).await;
    Ok((result, false, "MISS"))
}

/// §4.4 data-quality heuristic: the fraction of works/editions carrying
/// both an identifier and a cover image, plus a description-length term,
/// scaled to the `[0, 100]` range `CacheEntry::adjusted_ttl` expects.
fn data_quality_score(result: &SearchResult) -> u8 {
    let has_identifier_and_cover = |has_id: bool, cover: &Option<String>| has_id && cover.is_some();

    let mut carriers = 0usize;
    let mut with_id_and_cover = 0usize;
    let mut description_len_sum = 0usize;

    for work in &result.works {
        carriers += 1;
        let has_identifier = !work.external_ids.goodreads.is_empty()
            || !work.external_ids.amazon.is_empty()
            || !work.external_ids.librarything.is_empty()
            || !work.external_ids.googlebooks.is_empty();
        if has_identifier_and_cover(has_identifier, &work.cover_url) {
            with_id_and_cover += 1;
        }
        description_len_sum += work.description.as_deref().map(str::len).unwrap_or(0);
    }
    for edition in &result.editions {
        carriers += 1;
        if has_identifier_and_cover(edition.isbn_set.iter().count() > 0, &edition.cover_url) {
            with_id_and_cover += 1;
        }
        description_len_sum += edition.edition_description.as_deref().map(str::len).unwrap_or(0);
    }

    if carriers == 0 {
        return 50;
    }

    let identifier_cover_fraction = with_id_and_cover as f64 / carriers as f64;
    let description_term = (description_len_sum as f64 / carriers as f64 / 500.0).min(1.0);
    let score = (0.7 * identifier_cover_fraction + 0.3 * description_term).clamp(0.0, 1.0);

    (score * 100.0).round() as u8
}

fn envelope_response(result: SearchResult, cached: bool, cache_status: &str) -> HttpResponse {
    let mut envelope = Envelope::success(serde_json::json!({
        "works": result.works,
        "editions": result.editions,
        "authors": result.authors,
    }))
    .with_cached(cached);
    if let Some(provider) = result.provider.clone() {
        envelope = envelope.with_provider(provider);
    }
    HttpResponse::Ok().insert_header(("X-Cache-Status", cache_status)).json(envelope)
}

#[derive(Deserialize)]
pub struct IsbnQuery {
    pub isbn: String,
}

pub async fn search_by_isbn(state: web::Data<AppState>, query: web::Query<IsbnQuery>) -> Result<HttpResponse, GatewayError> {
    validation::validate_isbn(&query.isbn)?;
    let key = key_factory::key_for_isbn(&query.isbn);

    let (result, cached, cache_status) = read_or_resolve(&state, EndpointKind::IsbnLookup, &key, async {
        let resolved = state
            .engine
            .resolve_one(ResolveQuery { title: None, author: None, isbn: Some(&query.isbn) })
            .await?;
        Ok(match resolved {
            Some(r) => SearchResult {
                provider: Some(r.work.provenance.primary_provider.clone()),
                works: vec![r.work],
                editions: r.editions,
                authors: r.authors,
            },
            None => SearchResult::empty(),
        })
    })
    .await?;

    Ok(envelope_response(result, cached, cache_status))
}

#[derive(Deserialize)]
pub struct TitleQuery {
    pub q: String,
}

const TITLE_SEARCH_MAX_RESULTS: usize = 20;

pub async fn search_by_title(state: web::Data<AppState>, query: web::Query<TitleQuery>) -> Result<HttpResponse, GatewayError> {
    let sanitized = sanitize_search_query(&query.q);
    validation::validate_query(&sanitized)?;
    let key = key_factory::key_for_query(EndpointKind::TitleSearch, &sanitized);

    let (result, cached, cache_status) = read_or_resolve(&state, EndpointKind::TitleSearch, &key, async {
        let many = state.engine.resolve_many(&sanitized, TITLE_SEARCH_MAX_RESULTS).await?;
        Ok(SearchResult {
            provider: many.works.first().map(|w| w.provenance.primary_provider.clone()),
            works: many.works,
            editions: many.editions,
            authors: many.authors,
        })
    })
    .await?;

    Ok(envelope_response(result, cached, cache_status))
}

#[derive(Deserialize)]
pub struct AdvancedQuery {
    pub title: Option<String>,
    pub author: Option<String>,
}

pub async fn search_advanced(state: web::Data<AppState>, query: web::Query<AdvancedQuery>) -> Result<HttpResponse, GatewayError> {
    if query.title.is_none() && query.author.is_none() {
        return Err(GatewayError::InvalidRequest("at least one of title or author is required".to_string()));
    }

    let title = query.title.as_deref().map(sanitize_search_query);
    let author = query.author.as_deref().map(sanitize_search_query);

    let mut params = BTreeMap::new();
    if let Some(t) = title.as_deref() {
        params.insert("title", t);
    }
    if let Some(a) = author.as_deref() {
        params.insert("author", a);
    }
    let key = key_factory::key_for_params(EndpointKind::AuthorSearch, &params);

    let (result, cached, cache_status) = read_or_resolve(&state, EndpointKind::AuthorSearch, &key, async {
        let resolved = state
            .engine
            .resolve_one(ResolveQuery { title: title.as_deref(), author: author.as_deref(), isbn: None })
            .await?;
        Ok(match resolved {
            Some(r) => SearchResult {
                provider: Some(r.work.provenance.primary_provider.clone()),
                works: vec![r.work],
                editions: r.editions,
                authors: r.authors,
            },
            None => SearchResult::empty(),
        })
    })
    .await?;

    Ok(envelope_response(result, cached, cache_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_gateway_core::models::edition::IsbnSet;
    use biblio_gateway_core::models::work::{ExternalIds, Provenance};
    use biblio_gateway_core::types::{Format, ReviewStatus};

    fn bare_work(cover_url: Option<&str>, description: Option<&str>, has_id: bool) -> Work {
        Work {
            title: "Dune".to_string(),
            genres: Default::default(),
            provenance: Provenance::single("open_library"),
            review_status: ReviewStatus::Verified,
            quality_score: 50,
            synthetic: false,
            original_language: None,
            first_publication_year: None,
            description: description.map(str::to_string),
            cover_url: cover_url.map(str::to_string),
            external_ids: if has_id {
                ExternalIds { goodreads: ["123".to_string()].into_iter().collect(), ..Default::default() }
            } else {
                Default::default()
            },
            last_sync: None,
            detection_bounding_box: None,
        }
    }

    fn bare_edition(cover_url: Option<&str>, has_isbn: bool) -> Edition {
        let mut isbn_set = IsbnSet::new();
        if has_isbn {
            isbn_set.insert_canonicalizing("9780441013593");
        }
        Edition {
            isbn_set,
            format: Format::Hardcover,
            quality_score: 50,
            publisher: None,
            publication_date: None,
            page_count: None,
            cover_url: cover_url.map(str::to_string),
            edition_title: None,
            edition_description: None,
            language: None,
            external_ids: Default::default(),
        }
    }

    #[test]
    fn no_carriers_scores_the_neutral_midpoint() {
        let result = SearchResult::empty();
        assert_eq!(data_quality_score(&result), 50);
    }

    #[test]
    fn every_carrier_missing_an_identifier_or_cover_scores_low() {
        let result = SearchResult {
            works: vec![bare_work(None, None, false)],
            editions: vec![bare_edition(None, false)],
            authors: vec![],
            provider: None,
        };
        assert!(data_quality_score(&result) < 40);
    }

    #[test]
    fn full_identifier_cover_and_description_coverage_scores_high() {
        let long_description = "a".repeat(600);
        let result = SearchResult {
            works: vec![bare_work(Some("https://example.com/cover.jpg"), Some(&long_description), true)],
            editions: vec![bare_edition(Some("https://example.com/cover.jpg"), true)],
            authors: vec![],
            provider: None,
        };
        assert!(data_quality_score(&result) > 80);
    }
}
