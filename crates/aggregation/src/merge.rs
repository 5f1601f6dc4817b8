//! Merge rules for a Work contributed to by more than one provider (§4.5).

use biblio_gateway_core::models::work::Work;
use biblio_gateway_providers::genre_normalizer;

/// Fold `other` into `primary` in place, applying the §4.5 merge rules:
/// external-id sets union, genre tags re-normalized over the union of raw
/// inputs, longer non-empty description wins (ties favor the primary
/// provider), cover URL prefers HTTPS then the higher quality score.
pub fn merge_work(primary: &mut Work, other: &Work, other_raw_genres: &[String], threshold: f64) {
    primary.provenance.merge(&other.provenance);
    primary.external_ids = primary.external_ids.union(&other.external_ids);

    if !other_raw_genres.is_empty() {
        let mut union_raw: Vec<String> = primary.genres.iter().cloned().collect();
        union_raw.extend(other_raw_genres.iter().cloned());
        primary.genres = genre_normalizer::normalize_all(&union_raw, threshold, None);
    }

    primary.description = pick_description(primary.description.take(), other.description.clone());
    primary.cover_url = pick_cover_url(
        primary.cover_url.take(),
        primary.quality_score,
        other.cover_url.clone(),
        other.quality_score,
    );
}

fn pick_description(primary: Option<String>, other: Option<String>) -> Option<String> {
    match (primary, other) {
        (Some(p), Some(o)) => {
            if o.len() > p.len() {
                Some(o)
            } else {
                Some(p)
            }
        }
        (Some(p), None) => Some(p),
        (None, Some(o)) => Some(o),
        (None, None) => None,
    }
}

fn pick_cover_url(
    primary: Option<String>,
    primary_quality: u8,
    other: Option<String>,
    other_quality: u8,
) -> Option<String> {
    match (primary, other) {
        (Some(p), Some(o)) => {
            let p_https = p.starts_with("https://");
            let o_https = o.starts_with("https://");
            if p_https && !o_https {
                Some(p)
            } else if o_https && !p_https {
                Some(o)
            } else if other_quality > primary_quality {
                Some(o)
            } else {
                Some(p)
            }
        }
        (Some(p), None) => Some(p),
        (None, Some(o)) => Some(o),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longer_description_wins() {
        assert_eq!(pick_description(Some("short".to_string()), Some("a much longer one".to_string())), Some("a much longer one".to_string()));
    }

    #[test]
    fn tie_favors_primary_description() {
        assert_eq!(pick_description(Some("abcde".to_string()), Some("fghij".to_string())), Some("abcde".to_string()));
    }

    #[test]
    fn https_cover_beats_http_even_with_lower_quality() {
        let picked = pick_cover_url(
            Some("http://a/cover.jpg".to_string()),
            90,
            Some("https://b/cover.jpg".to_string()),
            10,
        );
        assert_eq!(picked, Some("https://b/cover.jpg".to_string()));
    }

    #[test]
    fn equal_protocol_prefers_higher_quality() {
        let picked = pick_cover_url(
            Some("https://a/cover.jpg".to_string()),
            40,
            Some("https://b/cover.jpg".to_string()),
            90,
        );
        assert_eq!(picked, Some("https://b/cover.jpg".to_string()));
    }
}
