//! Genre canonicalization (C2).
//!
//! Providers return free-text genre/subject tags in wildly different
//! vocabularies ("Sci-Fi", "Science Fiction & Fantasy", "SF", or a
//! hierarchical BISAC-style string like "Fiction / Science Fiction /
//! General"). Matching order: (i) an exact provider-specific map (covers
//! the hierarchical strings one provider is known to emit), (ii) a
//! case-insensitive synonym table, (iii) fuzzy match against the canonical
//! table, (iv) pass the tag through unchanged. A low-signal tag is dropped
//! unless it is the only tag the input batch contained.

use biblio_gateway_core::types::ProviderId;
use std::collections::BTreeSet;

/// Canonical genre vocabulary. Deliberately book-domain, not the catalog
/// taxonomies (BISAC, Goodreads shelves, ...) any single provider uses.
pub const CANONICAL_GENRES: &[&str] = &[
    "action_adventure",
    "biography",
    "business",
    "childrens",
    "classics",
    "comics_graphic_novels",
    "contemporary",
    "cooking",
    "crime",
    "fantasy",
    "fiction",
    "health",
    "historical_fiction",
    "history",
    "horror",
    "humor",
    "literary_fiction",
    "memoir",
    "mystery",
    "nonfiction",
    "philosophy",
    "poetry",
    "romance",
    "science",
    "science_fiction",
    "self_help",
    "thriller",
    "travel",
    "young_adult",
];

/// Raw tags that carry no genre information and should never surface,
/// exact-match or fuzzy — providers emit these as placeholders. Dropped
/// unless the whole batch consisted of nothing else.
const BLOCKLIST: &[&str] = &["uncategorized", "n/a", "unknown", "general", "misc", "other", "fiction"];

/// Step (i): hierarchical strings a specific provider is known to emit,
/// mapped straight to a canonical tag without running the fuzzy pass.
fn provider_exact_map(provider: Option<ProviderId>, normalized: &str) -> Option<&'static str> {
    match provider {
        Some(ProviderId::Isbndb) => match normalized {
            "fiction / science fiction / general" => Some("science_fiction"),
            "fiction / fantasy / general" => Some("fantasy"),
            "fiction / mystery & detective / general" => Some("mystery"),
            "fiction / romance / general" => Some("romance"),
            "fiction / thrillers / general" => Some("thriller"),
            "juvenile fiction / general" => Some("childrens"),
            "biography & autobiography / general" => Some("biography"),
            _ => None,
        },
        Some(ProviderId::GoogleBooks) => match normalized {
            "fiction / science fiction / general" => Some("science_fiction"),
            "biography & autobiography / general" => Some("biography"),
            "juvenile fiction / general" => Some("childrens"),
            "history / general" => Some("history"),
            _ => None,
        },
        Some(ProviderId::OpenLibrary) | Some(ProviderId::Vision) | None => None,
    }
}

/// Step (ii): synonyms seen often enough in provider payloads to skip the
/// fuzzy pass entirely.
fn exact_synonym(normalized: &str) -> Option<&'static str> {
    match normalized {
        "sci-fi" | "sci fi" | "sf" | "scifi" => Some("science_fiction"),
        "ya" => Some("young_adult"),
        "whodunit" | "detective" => Some("mystery"),
        "autobiography" => Some("memoir"),
        "cookbooks" | "cookery" => Some("cooking"),
        "graphic novels" | "comics" => Some("comics_graphic_novels"),
        _ => None,
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace('_', " ")
}

enum Classified {
    Canonical(String),
    Blocklisted(String),
}

fn classify(raw: &str, threshold: f64, provider: Option<ProviderId>) -> Option<Classified> {
    let key = normalize_key(raw);
    if key.is_empty() {
        return None;
    }
    if BLOCKLIST.contains(&key.as_str()) {
        return Some(Classified::Blocklisted(key.replace(' ', "_")));
    }
    if let Some(mapped) = provider_exact_map(provider, &key) {
        return Some(Classified::Canonical(mapped.to_string()));
    }
    if let Some(synonym) = exact_synonym(&key) {
        return Some(Classified::Canonical(synonym.to_string()));
    }
    let as_tag = key.replace(' ', "_");
    if CANONICAL_GENRES.contains(&as_tag.as_str()) {
        return Some(Classified::Canonical(as_tag));
    }

    let fuzzy = CANONICAL_GENRES
        .iter()
        .map(|canonical| {
            let candidate = canonical.replace('_', " ");
            (canonical, strsim::normalized_levenshtein(&key, &candidate))
        })
        .filter(|(_, score)| *score >= threshold)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(canonical, _)| canonical.to_string());

    match fuzzy {
        Some(canonical) => Some(Classified::Canonical(canonical)),
        // (iv) pass-through unchanged: nothing above claimed it.
        None => Some(Classified::Canonical(as_tag)),
    }
}

/// Map a single raw genre tag to a canonical (or passed-through) tag.
/// `threshold` is the minimum normalized-Levenshtein similarity (in
/// [0, 1]) against a canonical entry accepted as a match (default 0.85,
/// §4.2). A blocklisted tag is always dropped here — the sole-tag
/// exception only applies batch-wide, via [`normalize_all`].
pub fn normalize_one(raw: &str, threshold: f64, provider: Option<ProviderId>) -> Option<String> {
    match classify(raw, threshold, provider) {
        Some(Classified::Canonical(tag)) => Some(tag),
        Some(Classified::Blocklisted(_)) | None => None,
    }
}

/// Map a batch of raw genre tags, deduplicating into a set (I-3).
/// A blocklisted tag is dropped unless it is the only tag the batch
/// yielded, in which case it survives rather than leaving the work with
/// no genre at all.
pub fn normalize_all(raw_genres: &[String], threshold: f64, provider: Option<ProviderId>) -> BTreeSet<String> {
    let classified: Vec<Classified> = raw_genres.iter().filter_map(|raw| classify(raw, threshold, provider)).collect();

    if let [Classified::Blocklisted(tag)] = classified.as_slice() {
        let mut set = BTreeSet::new();
        set.insert(tag.clone());
        return set;
    }

    classified
        .into_iter()
        .filter_map(|c| match c {
            Classified::Canonical(tag) => Some(tag),
            Classified::Blocklisted(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_canonical_tag_passes_through() {
        assert_eq!(normalize_one("fantasy", 0.85, None), Some("fantasy".to_string()));
    }

    #[test]
    fn known_synonym_maps_to_canonical() {
        assert_eq!(normalize_one("Sci-Fi", 0.85, None), Some("science_fiction".to_string()));
        assert_eq!(normalize_one("YA", 0.85, None), Some("young_adult".to_string()));
    }

    #[test]
    fn provider_specific_hierarchical_string_maps_without_fuzzy_pass() {
        assert_eq!(
            normalize_one("Fiction / Science Fiction / General", 0.85, Some(ProviderId::Isbndb)),
            Some("science_fiction".to_string())
        );
    }

    #[test]
    fn blocklisted_tag_is_dropped_when_not_alone() {
        assert_eq!(normalize_one("Uncategorized", 0.85, None), None);
        assert_eq!(normalize_one("N/A", 0.85, None), None);
    }

    #[test]
    fn blocklisted_tag_survives_as_the_sole_tag() {
        let raw = vec!["Fiction".to_string()];
        let normalized = normalize_all(&raw, 0.85, None);
        assert_eq!(normalized, BTreeSet::from(["fiction".to_string()]));
    }

    #[test]
    fn blocklisted_tag_is_dropped_when_other_tags_are_present() {
        let raw = vec!["Fiction".to_string(), "Fantasy".to_string()];
        let normalized = normalize_all(&raw, 0.85, None);
        assert_eq!(normalized, BTreeSet::from(["fantasy".to_string()]));
    }

    #[test]
    fn close_misspelling_matches_above_threshold() {
        assert_eq!(normalize_one("Hstory", 0.85, None), Some("history".to_string()));
    }

    #[test]
    fn unmatched_tag_passes_through_unchanged() {
        assert_eq!(normalize_one("steampunk", 0.85, None), Some("steampunk".to_string()));
    }

    #[test]
    fn normalize_all_deduplicates() {
        let raw = vec!["Fantasy".to_string(), "fantasy".to_string(), "Sci-Fi".to_string()];
        let normalized = normalize_all(&raw, 0.85, None);
        assert_eq!(normalized.len(), 2);
        assert!(normalized.contains("fantasy"));
        assert!(normalized.contains("science_fiction"));
    }
}
