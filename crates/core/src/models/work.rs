//! Work — an abstract creative artifact (§3).

use crate::types::ReviewStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Provenance of a record: one primary provider plus the set of providers
/// that contributed to it. I-1: the contributor set is never empty and
/// always contains the primary provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub primary_provider: String,
    pub contributors: BTreeSet<String>,
}

impl Provenance {
    pub fn single(provider: impl Into<String>) -> Self {
        let provider = provider.into();
        let mut contributors = BTreeSet::new();
        contributors.insert(provider.clone());
        Self {
            primary_provider: provider,
            contributors,
        }
    }

    /// I-1 as a runtime check, used by tests and by the aggregation engine
    /// before a Work ever leaves the merge step.
    pub fn is_valid(&self) -> bool {
        !self.contributors.is_empty() && self.contributors.contains(&self.primary_provider)
    }

    pub fn merge(&mut self, other: &Provenance) {
        self.contributors.extend(other.contributors.iter().cloned());
    }
}

/// Per-provider external identifier sets (§3). Each is a true set: no
/// duplicates, no observable order (I-3) — callers should treat iteration
/// order as incidental, even though `BTreeSet` happens to sort it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub goodreads: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub amazon: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub librarything: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub googlebooks: BTreeSet<String>,
}

impl ExternalIds {
    pub fn union(&self, other: &ExternalIds) -> ExternalIds {
        ExternalIds {
            goodreads: self.goodreads.union(&other.goodreads).cloned().collect(),
            amazon: self.amazon.union(&other.amazon).cloned().collect(),
            librarything: self
                .librarything
                .union(&other.librarything)
                .cloned()
                .collect(),
            googlebooks: self
                .googlebooks
                .union(&other.googlebooks)
                .cloned()
                .collect(),
        }
    }
}

/// A detection bounding box: four normalized floats in [0, 1]
/// (left, top, width, height), attached only when a Work originated from a
/// bookshelf-scan detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn is_normalized(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    pub title: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub genres: BTreeSet<String>,
    pub provenance: Provenance,
    pub review_status: ReviewStatus,
    /// Quality score in [0, 100].
    pub quality_score: u8,
    /// `true` iff this Work was reconstructed from an Edition because no
    /// upstream provider emitted a Work record directly.
    pub synthetic: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_publication_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "ExternalIds::is_default")]
    pub external_ids: ExternalIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_bounding_box: Option<BoundingBox>,
}

impl ExternalIds {
    pub(crate) fn is_default(&self) -> bool {
        self.goodreads.is_empty()
            && self.amazon.is_empty()
            && self.librarything.is_empty()
            && self.googlebooks.is_empty()
    }
}

impl Work {
    /// I-1 as a runtime invariant check.
    pub fn satisfies_provenance_invariant(&self) -> bool {
        self.provenance.is_valid()
    }

    pub fn clamp_quality_score(score: f64) -> u8 {
        if score.is_nan() {
            50
        } else {
            score.round().clamp(0.0, 100.0) as u8
        }
    }
}
