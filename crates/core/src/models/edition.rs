//! Edition — a specific manifestation (ISBN) of a Work (§3).

use crate::isbn;
use crate::models::work::ExternalIds;
use crate::types::Format;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edition {
    /// Raw ISBN strings as observed from providers. ISBN-10 forms are
    /// canonicalized to ISBN-13 when both forms are present for the same
    /// book (I-2) — see [`IsbnSet::insert_canonicalizing`].
    #[serde(rename = "isbns")]
    pub isbn_set: IsbnSet,
    pub format: Format,
    /// Quality score in [0, 100].
    pub quality_score: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<PublicationDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub external_ids: ExternalIds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublicationDate {
    Year(i32),
    Full(chrono::NaiveDate),
}

/// A set of ISBN strings, kept de-duplicated at the canonical-ISBN-13 level
/// (I-2: no two elements may canonicalize to the same ISBN-13).
///
/// The raw observed forms are preserved (so an ISBN-10 and its ISBN-13
/// counterpart can both surface to clients, matching scenario S-1), but the
/// set never holds two raw strings that canonicalize to the same number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IsbnSet {
    raw: BTreeSet<String>,
}

impl IsbnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `raw_isbn`. If an ISBN already in the set canonicalizes to the
    /// same ISBN-13 number, the two are merged into a single entry holding
    /// the ISBN-13 form (I-2: "ISBN-10 forms canonicalized to their ISBN-13
    /// when both present"). An ISBN observed only in ISBN-10 form is kept
    /// as ISBN-10 until an ISBN-13 counterpart is seen.
    pub fn insert_canonicalizing(&mut self, raw_isbn: &str) {
        let normalized = isbn::normalize(raw_isbn);
        let canonical = isbn::canonicalize(&normalized);
        let is_isbn13 = normalized.len() == 13;

        if let Some(existing) = self
            .raw
            .iter()
            .find(|existing| isbn::canonicalize(existing) == canonical)
            .cloned()
        {
            if is_isbn13 && existing.len() != 13 {
                self.raw.remove(&existing);
                self.raw.insert(normalized);
            }
            // else: either already canonical, or the new form is ISBN-10
            // and an ISBN-13 is already on file — keep the ISBN-13.
            return;
        }

        self.raw.insert(normalized);
    }

    pub fn contains_canonical(&self, raw_isbn: &str) -> bool {
        let canonical = isbn::canonicalize(raw_isbn);
        self.raw
            .iter()
            .any(|existing| isbn::canonicalize(existing) == canonical)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.raw.iter()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// I-2 as a runtime invariant check: no two canonicalized entries match.
    pub fn satisfies_no_duplicate_canonical_forms(&self) -> bool {
        let canonicalized: Vec<String> = self.raw.iter().map(|s| isbn::canonicalize(s)).collect();
        let unique: BTreeSet<&String> = canonicalized.iter().collect();
        unique.len() == canonicalized.len()
    }

    pub fn union(&self, other: &IsbnSet) -> IsbnSet {
        let mut merged = self.clone();
        for isbn in other.raw.iter() {
            merged.insert_canonicalizing(isbn);
        }
        merged
    }
}

impl FromIterator<String> for IsbnSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = IsbnSet::new();
        for isbn in iter {
            set.insert_canonicalizing(&isbn);
        }
        set
    }
}
