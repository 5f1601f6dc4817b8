//! Open Library adapter (§4.1) — a free, unauthenticated public catalog.
//! Response fields are sparser than ISBNdb's, so its contributions tend to
//! carry a lower quality score and are more often superseded in merges
//! (§4.5), but it has no rate limit and is a reliable fallback.

use crate::adapter::{Lookup, NormalizedRecord, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use biblio_gateway_core::models::author::Author;
use biblio_gateway_core::models::edition::{Edition, IsbnSet};
use biblio_gateway_core::models::work::{Provenance, Work};
use biblio_gateway_core::types::{Format, ProviderId, ReviewStatus};
use serde::Deserialize;

const OPEN_LIBRARY_BASE_URL: &str = "https://openlibrary.org";

#[derive(Debug, Deserialize, Default)]
struct OpenLibraryBook {
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    publisher: Option<Vec<String>>,
    #[serde(default)]
    subject: Vec<String>,
    number_of_pages_median: Option<u32>,
    first_publish_year: Option<i32>,
    cover_i: Option<u64>,
}

pub struct OpenLibraryAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl Default for OpenLibraryAdapter {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPEN_LIBRARY_BASE_URL.to_string(),
        }
    }
}

impl OpenLibraryAdapter {
    fn to_normalized_record(&self, isbn_or_query: &str, book: OpenLibraryBook) -> NormalizedRecord {
        let genres = crate::genre_normalizer::normalize_all(&book.subject, 0.85, Some(ProviderId::OpenLibrary));

        let authors: Vec<Author> = book.author_name.iter().map(|n| Author::new(n.clone())).collect();

        // No synopsis/image flags available from this endpoint -> at most
        // three of the six quality signals can ever be present, so Open
        // Library contributions are capped below a "rich" ISBNdb record.
        let signals = [
            book.number_of_pages_median.map(|p| p > 0).unwrap_or(false),
            book.publisher.as_ref().map(|p| !p.is_empty()).unwrap_or(false),
            !book.subject.is_empty(),
        ];
        let present = signals.iter().filter(|s| **s).count() as f64;
        let quality_score = Work::clamp_quality_score(present / 6.0 * 100.0);

        let cover_url = book.cover_i.map(|id| format!("https://covers.openlibrary.org/b/id/{id}-L.jpg"));

        let work = Work {
            title: book.title.clone().unwrap_or_default(),
            genres,
            provenance: Provenance::single(ProviderId::OpenLibrary.as_str()),
            review_status: ReviewStatus::NeedsReview,
            quality_score,
            synthetic: false,
            original_language: None,
            first_publication_year: book.first_publish_year,
            description: None,
            cover_url: cover_url.clone(),
            external_ids: Default::default(),
            last_sync: Some(chrono::Utc::now()),
            detection_bounding_box: None,
        };

        let mut isbn_set = IsbnSet::new();
        if biblio_gateway_core::isbn::is_valid(isbn_or_query) {
            isbn_set.insert_canonicalizing(isbn_or_query);
        }

        let edition = Edition {
            isbn_set,
            format: Format::Paperback,
            quality_score,
            publisher: book.publisher.and_then(|p| p.into_iter().next()),
            publication_date: None,
            page_count: book.number_of_pages_median,
            cover_url,
            edition_title: book.title,
            edition_description: None,
            language: None,
            external_ids: Default::default(),
        };

        NormalizedRecord {
            provider: ProviderId::OpenLibrary,
            work,
            editions: vec![edition],
            authors,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenLibraryAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenLibrary
    }

    async fn fetch(&self, lookup: Lookup<'_>) -> Result<Vec<NormalizedRecord>, ProviderError> {
        let (url, key) = match lookup {
            Lookup::Isbn(isbn) => (
                format!("{}/search.json?isbn={}", self.base_url, isbn),
                isbn.to_string(),
            ),
            Lookup::Title(title) => (
                format!("{}/search.json?title={}", self.base_url, urlencode(title)),
                title.to_string(),
            ),
            Lookup::Author(author) => (
                format!("{}/search.json?author={}", self.base_url, urlencode(author)),
                author.to_string(),
            ),
        };

        #[derive(Deserialize)]
        struct SearchResponse {
            docs: Vec<OpenLibraryBook>,
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e, ProviderId::OpenLibrary))?;

        match response.status().as_u16() {
            200 => {
                let body: SearchResponse = response.json().await.map_err(|e| ProviderError::MalformedResponse {
                    provider: ProviderId::OpenLibrary,
                    reason: e.to_string(),
                })?;
                Ok(body
                    .docs
                    .into_iter()
                    .map(|doc| self.to_normalized_record(&key, doc))
                    .collect())
            }
            429 => Err(ProviderError::RateLimited { provider: ProviderId::OpenLibrary }),
            status => Err(ProviderError::UpstreamError { provider: ProviderId::OpenLibrary, status }),
        }
    }
}

fn urlencode(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_string() } else { format!("%{:02X}", c as u32) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_record_never_exceeds_half_quality_score() {
        let book = OpenLibraryBook {
            title: Some("Dune".to_string()),
            author_name: vec!["Frank Herbert".to_string()],
            publisher: Some(vec!["Chilton".to_string()]),
            subject: vec!["Science Fiction".to_string()],
            number_of_pages_median: Some(412),
            first_publish_year: Some(1965),
            cover_i: None,
        };
        let adapter = OpenLibraryAdapter::default();
        let record = adapter.to_normalized_record("9780441013593", book);
        assert!(record.work.quality_score <= 50);
    }

    #[test]
    fn missing_isbn_leaves_edition_isbn_set_empty() {
        let book = OpenLibraryBook::default();
        let adapter = OpenLibraryAdapter::default();
        let record = adapter.to_normalized_record("dune", book);
        assert!(record.editions[0].isbn_set.is_empty());
    }
}
