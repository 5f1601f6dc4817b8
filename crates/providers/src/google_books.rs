//! Google Books adapter (§4.1) — a free public catalog, optionally
//! accelerated with an API key for higher quota. Volume records carry a
//! description and thumbnail often enough to outscore Open Library, but
//! rarely a full subject taxonomy.

use crate::adapter::{Lookup, NormalizedRecord, ProviderAdapter, ProviderError};
use async_trait::async_trait;
use biblio_gateway_core::models::author::Author;
use biblio_gateway_core::models::edition::{Edition, IsbnSet};
use biblio_gateway_core::models::work::{Provenance, Work};
use biblio_gateway_core::types::{Format, ProviderId, ReviewStatus};
use serde::Deserialize;

const GOOGLE_BOOKS_BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const MIN_DESCRIPTION_LEN: usize = 50;

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize, Default)]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "pageCount")]
    page_count: Option<u32>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
    language: Option<String>,
    #[serde(rename = "industryIdentifiers", default)]
    industry_identifiers: Vec<IndustryIdentifier>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    id_type: String,
    identifier: String,
}

pub struct GoogleBooksAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleBooksAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: GOOGLE_BOOKS_BASE_URL.to_string(),
        }
    }

    fn to_normalized_record(&self, info: VolumeInfo) -> NormalizedRecord {
        let genres = crate::genre_normalizer::normalize_all(&info.categories, 0.85, Some(ProviderId::GoogleBooks));
        let authors: Vec<Author> = info.authors.iter().map(|n| Author::new(n.clone())).collect();
        let cover_url = info.image_links.as_ref().and_then(|l| l.thumbnail.clone());

        let signals = [
            cover_url.is_some(),
            info.description.as_deref().map(|d| d.len() >= MIN_DESCRIPTION_LEN).unwrap_or(false),
            info.page_count.map(|p| p > 0).unwrap_or(false),
            info.publisher.is_some(),
            !info.categories.is_empty(),
            !info.authors.is_empty(),
        ];
        let present = signals.iter().filter(|s| **s).count() as f64;
        let quality_score = Work::clamp_quality_score(present / signals.len() as f64 * 100.0);

        let work = Work {
            title: info.title.clone().unwrap_or_default(),
            genres,
            provenance: Provenance::single(ProviderId::GoogleBooks.as_str()),
            review_status: ReviewStatus::Verified,
            quality_score,
            synthetic: false,
            original_language: info.language.clone(),
            first_publication_year: parse_year(info.published_date.as_deref()),
            description: info.description.clone(),
            cover_url: cover_url.clone(),
            external_ids: Default::default(),
            last_sync: Some(chrono::Utc::now()),
            detection_bounding_box: None,
        };

        let mut isbn_set = IsbnSet::new();
        for id in &info.industry_identifiers {
            if id.id_type.starts_with("ISBN") {
                isbn_set.insert_canonicalizing(&id.identifier);
            }
        }

        let edition = Edition {
            isbn_set,
            format: Format::Ebook,
            quality_score,
            publisher: info.publisher,
            publication_date: None,
            page_count: info.page_count,
            cover_url,
            edition_title: info.title,
            edition_description: info.description,
            language: info.language,
            external_ids: Default::default(),
        };

        NormalizedRecord {
            provider: ProviderId::GoogleBooks,
            work,
            editions: vec![edition],
            authors,
        }
    }
}

#[async_trait]
impl ProviderAdapter for GoogleBooksAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::GoogleBooks
    }

    async fn fetch(&self, lookup: Lookup<'_>) -> Result<Vec<NormalizedRecord>, ProviderError> {
        let query = match lookup {
            Lookup::Isbn(isbn) => format!("isbn:{isbn}"),
            Lookup::Title(title) => format!("intitle:{title}"),
            Lookup::Author(author) => format!("inauthor:{author}"),
        };

        let mut request = self.client.get(&self.base_url).query(&[("q", query.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e, ProviderId::GoogleBooks))?;

        match response.status().as_u16() {
            200 => {
                let body: VolumesResponse = response.json().await.map_err(|e| ProviderError::MalformedResponse {
                    provider: ProviderId::GoogleBooks,
                    reason: e.to_string(),
                })?;
                Ok(body.items.into_iter().map(|item| self.to_normalized_record(item.volume_info)).collect())
            }
            429 => Err(ProviderError::RateLimited { provider: ProviderId::GoogleBooks }),
            status => Err(ProviderError::UpstreamError { provider: ProviderId::GoogleBooks, status }),
        }
    }
}

fn parse_year(published_date: Option<&str>) -> Option<i32> {
    published_date?.get(0..4)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume_info(isbn13: Option<&str>) -> VolumeInfo {
        VolumeInfo {
            title: Some("Dune".to_string()),
            authors: vec!["Frank Herbert".to_string()],
            publisher: Some("Ace".to_string()),
            published_date: Some("1965-08-01".to_string()),
            description: Some("a".repeat(60)),
            page_count: Some(412),
            categories: vec!["Fiction".to_string()],
            image_links: Some(ImageLinks { thumbnail: Some("cover.jpg".to_string()) }),
            language: Some("en".to_string()),
            industry_identifiers: isbn13
                .map(|isbn| vec![IndustryIdentifier { id_type: "ISBN_13".to_string(), identifier: isbn.to_string() }])
                .unwrap_or_default(),
        }
    }

    #[test]
    fn rich_volume_scores_100() {
        let adapter = GoogleBooksAdapter::new(None);
        let record = adapter.to_normalized_record(volume_info(Some("9780441013593")));
        assert_eq!(record.work.quality_score, 100);
    }

    #[test]
    fn only_isbn13_identifiers_are_collected() {
        let adapter = GoogleBooksAdapter::new(None);
        let record = adapter.to_normalized_record(volume_info(Some("9780441013593")));
        assert_eq!(record.editions[0].isbn_set.len(), 1);
    }

    #[test]
    fn parse_year_reads_leading_four_digits() {
        assert_eq!(parse_year(Some("1965-08-01")), Some(1965));
    }
}
