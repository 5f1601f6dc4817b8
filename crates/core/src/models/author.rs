//! Author — a creator attributed to one or more Works (§3).

use crate::models::work::ExternalIds;
use crate::types::{CulturalRegion, Gender};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    /// `unknown` is the bottom value, never a failure.
    #[serde(default)]
    pub gender: Gender,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultural_region: Option<CulturalRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_year: Option<i32>,
    #[serde(default, skip_serializing_if = "ExternalIds::is_default")]
    pub external_ids: ExternalIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_book_count: Option<u32>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gender: Gender::default(),
            cultural_region: None,
            nationality: None,
            birth_year: None,
            death_year: None,
            external_ids: ExternalIds::default(),
            total_book_count: None,
        }
    }

    /// An author is living, dead, or of unknown status; a death year before
    /// a birth year is never a valid observation.
    pub fn has_consistent_lifespan(&self) -> bool {
        match (self.birth_year, self.death_year) {
            (Some(birth), Some(death)) => death >= birth,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_author_defaults_gender_to_unknown() {
        let a = Author::new("Jane Doe");
        assert_eq!(a.gender, Gender::Unknown);
    }

    #[test]
    fn consistent_lifespan_accepts_missing_years() {
        let a = Author::new("Jane Doe");
        assert!(a.has_consistent_lifespan());
    }

    #[test]
    fn inconsistent_lifespan_rejects_death_before_birth() {
        let mut a = Author::new("Jane Doe");
        a.birth_year = Some(1950);
        a.death_year = Some(1940);
        assert!(!a.has_consistent_lifespan());
    }
}
