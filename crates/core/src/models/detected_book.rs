//! DetectedBook — one spine/cover detected in a bookshelf-scan image (§3, C11).

use crate::models::work::BoundingBox;
use serde::{Deserialize, Serialize};

/// A candidate book surfaced by the vision adapter, before enrichment.
/// `confidence` below the configured threshold routes the candidate to
/// `needs_review` instead of `approved` (§4.6) — the threshold only
/// partitions the two buckets, it never discards a detection outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedBook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_guess: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_guess: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn_guess: Option<String>,
    /// Detection confidence in [0, 1].
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    /// Populated once the enrichment pipeline has resolved this detection
    /// against the provider adapters; absent while the scan job is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<DetectedBookEnrichment>,
}

/// The enrichment outcome attached to a [`DetectedBook`] once resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedBookEnrichment {
    pub work_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl DetectedBook {
    pub fn is_above_threshold(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}
