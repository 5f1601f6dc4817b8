//! The bookshelf-scan vision adapter (C1's `detectBooksInImage`).
//!
//! The vision model's prompt/internal reasoning is a black box; this
//! adapter's only job is to call it and translate whatever it returns into
//! [`DetectedBook`] candidates. No confidence filtering happens here — the
//! approved/needs-review partition is a presentation concern applied later
//! against the configured threshold, never a filter on what this adapter
//! returns.

use async_trait::async_trait;
use biblio_gateway_core::models::detected_book::DetectedBook;
use biblio_gateway_core::models::work::BoundingBox;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision model request timed out")]
    Timeout,

    #[error("vision model rate limit exceeded")]
    RateLimited,

    #[error("vision model responded with an upstream error: {status}")]
    UpstreamError { status: u16 },

    #[error("vision model returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("vision model transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait VisionAdapter: Send + Sync {
    async fn detect_books_in_image(&self, image_bytes: Vec<u8>) -> Result<Vec<DetectedBook>, VisionError>;
}

#[derive(Debug, Deserialize)]
struct DetectionResponse {
    #[serde(default)]
    detections: Vec<RawDetection>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    title_guess: Option<String>,
    author_guess: Option<String>,
    isbn_guess: Option<String>,
    confidence: f32,
    bounding_box: RawBoundingBox,
}

#[derive(Debug, Deserialize)]
struct RawBoundingBox {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

/// Calls an HTTP vision-model endpoint that accepts an image and returns a
/// JSON list of detections. The endpoint's internal model choice and
/// prompting are out of scope; this adapter only shapes request/response.
pub struct HttpVisionAdapter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpVisionAdapter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl VisionAdapter for HttpVisionAdapter {
    async fn detect_books_in_image(&self, image_bytes: Vec<u8>) -> Result<Vec<DetectedBook>, VisionError> {
        let part = reqwest::multipart::Part::bytes(image_bytes).file_name("shelf.jpg");
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;

        match response.status().as_u16() {
            200 => {
                let body: DetectionResponse = response
                    .json()
                    .await
                    .map_err(|e| VisionError::MalformedResponse(e.to_string()))?;
                Ok(body.detections.into_iter().map(to_detected_book).collect())
            }
            429 => Err(VisionError::RateLimited),
            408 | 504 => Err(VisionError::Timeout),
            status => Err(VisionError::UpstreamError { status }),
        }
    }
}

fn to_detected_book(raw: RawDetection) -> DetectedBook {
    DetectedBook {
        title_guess: raw.title_guess,
        author_guess: raw.author_guess,
        isbn_guess: raw.isbn_guess,
        confidence: raw.confidence.clamp(0.0, 1.0),
        bounding_box: BoundingBox {
            left: raw.bounding_box.left,
            top: raw.bounding_box.top,
            width: raw.bounding_box.width,
            height: raw.bounding_box.height,
        },
        enrichment: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_confidence_is_clamped_into_unit_range() {
        let raw = RawDetection {
            title_guess: Some("Dune".to_string()),
            author_guess: None,
            isbn_guess: None,
            confidence: 1.4,
            bounding_box: RawBoundingBox { left: 0.0, top: 0.0, width: 0.1, height: 0.1 },
        };
        let book = to_detected_book(raw);
        assert_eq!(book.confidence, 1.0);
    }

    #[test]
    fn detected_book_starts_without_enrichment() {
        let raw = RawDetection {
            title_guess: None,
            author_guess: None,
            isbn_guess: None,
            confidence: 0.4,
            bounding_box: RawBoundingBox { left: 0.1, top: 0.1, width: 0.2, height: 0.3 },
        };
        let book = to_detected_book(raw);
        assert!(book.enrichment.is_none());
    }
}
