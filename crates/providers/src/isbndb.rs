//! ISBNdb adapter (§4.1) — a commercial, API-key-gated catalog. Its
//! response is rich enough to compute a deterministic quality score from
//! field presence alone (C1): one point each for a cover image, a synopsis
//! of at least 50 characters, a positive page count, a publisher, at least
//! one subject, and at least one author, scaled to [0, 100].

use crate::adapter::{Lookup, NormalizedRecord, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use biblio_gateway_core::models::author::Author;
use biblio_gateway_core::models::edition::Edition;
use biblio_gateway_core::models::work::{Provenance, Work};
use biblio_gateway_core::types::{Format, ProviderId, ReviewStatus};
use serde::Deserialize;
use std::collections::BTreeSet;

const ISBNDB_BASE_URL: &str = "https://api2.isbndb.com";
const MIN_SYNOPSIS_LEN: usize = 50;

#[derive(Debug, Deserialize)]
struct IsbndbBookResponse {
    book: IsbndbBook,
}

#[derive(Debug, Deserialize, Default)]
struct IsbndbBook {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    synopsis: Option<String>,
    image: Option<String>,
    pages: Option<u32>,
    #[serde(default)]
    subjects: Vec<String>,
    date_published: Option<String>,
    language: Option<String>,
}

pub struct IsbndbAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl IsbndbAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: ISBNDB_BASE_URL.to_string(),
        }
    }

    /// Field-presence quality score (C1). Each of the six signals
    /// contributes equally; absence of all six yields 0, presence of all
    /// six yields 100.
    pub fn quality_score(book: &IsbndbBook) -> u8 {
        let signals = [
            book.image.is_some(),
            book.synopsis.as_deref().map(|s| s.len() >= MIN_SYNOPSIS_LEN).unwrap_or(false),
            book.pages.map(|p| p > 0).unwrap_or(false),
            book.publisher.is_some(),
            !book.subjects.is_empty(),
            !book.authors.is_empty(),
        ];
        let present = signals.iter().filter(|s| **s).count() as f64;
        Work::clamp_quality_score(present / signals.len() as f64 * 100.0)
    }

    fn to_normalized_record(&self, isbn: &str, book: IsbndbBook) -> NormalizedRecord {
        let quality_score = Self::quality_score(&book);
        let genres: BTreeSet<String> =
            crate::genre_normalizer::normalize_all(&book.subjects, 0.85, Some(ProviderId::Isbndb));

        let mut authors = Vec::new();
        for name in &book.authors {
            authors.push(Author::new(name.clone()));
        }

        let provenance = Provenance::single(ProviderId::Isbndb.as_str());
        let work = Work {
            title: book.title.clone().unwrap_or_default(),
            genres,
            provenance: provenance.clone(),
            review_status: ReviewStatus::Verified,
            quality_score,
            synthetic: false,
            original_language: book.language.clone(),
            first_publication_year: parse_year(book.date_published.as_deref()),
            description: book.synopsis.clone(),
            cover_url: book.image.clone(),
            external_ids: Default::default(),
            last_sync: Some(chrono::Utc::now()),
            detection_bounding_box: None,
        };

        let mut isbn_set = biblio_gateway_core::models::edition::IsbnSet::new();
        isbn_set.insert_canonicalizing(isbn);

        let edition = Edition {
            isbn_set,
            format: Format::Paperback,
            quality_score,
            publisher: book.publisher,
            publication_date: None,
            page_count: book.pages,
            cover_url: book.image,
            edition_title: book.title,
            edition_description: book.synopsis,
            language: book.language,
            external_ids: Default::default(),
        };

        NormalizedRecord {
            provider: ProviderId::Isbndb,
            work,
            editions: vec![edition],
            authors,
        }
    }
}

#[async_trait]
impl ProviderAdapter for IsbndbAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Isbndb
    }

    async fn fetch(&self, lookup: Lookup<'_>) -> Result<Vec<NormalizedRecord>, ProviderError> {
        let isbn = match lookup {
            Lookup::Isbn(isbn) => isbn,
            _ => return Ok(Vec::new()), // ISBNdb's book endpoint is ISBN-only (§4.1).
        };

        let url = format!("{}/book/{}", self.base_url, isbn);
        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e, ProviderId::Isbndb))?;

        match response.status().as_u16() {
            200 => {
                let body: IsbndbBookResponse = response.json().await.map_err(|e| ProviderError::MalformedResponse {
                    provider: ProviderId::Isbndb,
                    reason: e.to_string(),
                })?;
                Ok(vec![self.to_normalized_record(isbn, body.book)])
            }
            401 | 403 => Err(ProviderError::AuthFailed { provider: ProviderId::Isbndb }),
            404 => Ok(Vec::new()),
            429 => Err(ProviderError::RateLimited { provider: ProviderId::Isbndb }),
            status => Err(ProviderError::UpstreamError { provider: ProviderId::Isbndb, status }),
        }
    }
}

fn parse_year(date_published: Option<&str>) -> Option<i32> {
    date_published?.get(0..4)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(
        image: Option<&str>,
        synopsis: Option<&str>,
        pages: Option<u32>,
        publisher: Option<&str>,
        subjects: Vec<&str>,
        authors: Vec<&str>,
    ) -> IsbndbBook {
        IsbndbBook {
            title: Some("Test Book".to_string()),
            authors: authors.into_iter().map(String::from).collect(),
            publisher: publisher.map(String::from),
            synopsis: synopsis.map(String::from),
            image: image.map(String::from),
            pages,
            subjects: subjects.into_iter().map(String::from).collect(),
            date_published: None,
            language: None,
        }
    }

    #[test]
    fn all_signals_present_scores_100() {
        let b = book(
            Some("cover.jpg"),
            Some(&"a".repeat(60)),
            Some(300),
            Some("Penguin"),
            vec!["fantasy"],
            vec!["Jane Doe"],
        );
        assert_eq!(IsbndbAdapter::quality_score(&b), 100);
    }

    #[test]
    fn no_signals_present_scores_0() {
        let b = book(None, None, None, None, vec![], vec![]);
        assert_eq!(IsbndbAdapter::quality_score(&b), 0);
    }

    #[test]
    fn short_synopsis_does_not_count_as_present() {
        let b = book(Some("cover.jpg"), Some("too short"), Some(300), Some("Penguin"), vec!["fantasy"], vec!["Jane Doe"]);
        // 5 of 6 signals present -> 83 (rounded).
        assert_eq!(IsbndbAdapter::quality_score(&b), 83);
    }

    #[test]
    fn parse_year_reads_leading_four_digits() {
        assert_eq!(parse_year(Some("1997-06-26")), Some(1997));
        assert_eq!(parse_year(None), None);
    }
}
