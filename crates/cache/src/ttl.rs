//! TTL policy (§4.4): base TTL per endpoint kind, quality-adjusted at
//! write time. The base table and the adjustment formula both live on the
//! core types ([`EndpointKind::base_ttl`] and [`CacheEntry::adjusted_ttl`]);
//! this module just composes them into the one call sites actually need.

use biblio_gateway_core::models::cache::CacheEntry;
use biblio_gateway_core::types::EndpointKind;
use chrono::Duration;

/// TTL for a write of the given endpoint kind and quality score (in [0, 100]).
pub fn ttl_for(kind: EndpointKind, quality_score: u8) -> Duration {
    CacheEntry::adjusted_ttl(kind.base_ttl(), quality_score)
}

/// T1 gets the lesser of a 6-hour cap and whatever's left of the T2 entry's
/// TTL, so the edge tier never outlives the record it mirrors (§4.4 step 2).
pub fn t1_mirror_ttl(t2_remaining: Duration) -> Duration {
    let cap = Duration::hours(6);
    if t2_remaining < cap {
        t2_remaining
    } else {
        cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_quality_isbn_lookup_doubles_thirty_day_base() {
        assert_eq!(ttl_for(EndpointKind::IsbnLookup, 95), Duration::days(60));
    }

    #[test]
    fn t1_mirror_ttl_caps_at_six_hours() {
        assert_eq!(t1_mirror_ttl(Duration::days(30)), Duration::hours(6));
    }

    #[test]
    fn t1_mirror_ttl_passes_through_shorter_remainder() {
        assert_eq!(t1_mirror_ttl(Duration::hours(2)), Duration::hours(2));
    }
}
