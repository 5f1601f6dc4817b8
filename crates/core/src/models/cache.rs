//! Cache entry models shared by the T1/T2/T3 tiers (§3, §4.4).

use crate::types::{CacheTier, EndpointKind};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A cached response, tagged with the tier it was read from (I-6: callers
/// must be able to tell a T1 hit from a T2 hit from a cold-archive
/// rehydration, even though the payload itself is identical).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub payload: serde_json::Value,
    pub cached_at: DateTime<Utc>,
    pub ttl: Duration,
    pub tier: CacheTier,
}

impl CacheEntry {
    pub fn new(
        cache_key: impl Into<String>,
        payload: serde_json::Value,
        cached_at: DateTime<Utc>,
        ttl: Duration,
        tier: CacheTier,
    ) -> Self {
        Self {
            cache_key: cache_key.into(),
            payload,
            cached_at,
            ttl,
            tier,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.cached_at + self.ttl
    }

    /// Quality-adjusted TTL (§4.4): scores above 0.8 double the base TTL,
    /// scores below 0.4 halve it, everything else keeps the base value.
    pub fn adjusted_ttl(base: Duration, quality_score: u8) -> Duration {
        if quality_score > 80 {
            base * 2
        } else if quality_score < 40 {
            base / 2
        } else {
            base
        }
    }
}

/// An index entry pointing at a payload archived to the cold tier (T3).
/// The cold tier never holds the payload directly in memory — only this
/// pointer, plus the archive path computed from `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColdIndexEntry {
    pub cache_key: String,
    pub archive_path: String,
    pub created_at: DateTime<Utc>,
    pub payload_size: u64,
    pub endpoint_kind: EndpointKind,
}

impl ColdIndexEntry {
    /// Deterministic archive path: `{year}/{month}/{cache_key}`.
    pub fn archive_path_for(created_at: DateTime<Utc>, cache_key: &str) -> String {
        format!(
            "{:04}/{:02}/{}",
            created_at.format("%Y").to_string().parse::<u32>().unwrap_or(0),
            created_at.format("%m").to_string().parse::<u32>().unwrap_or(0),
            cache_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_quality_doubles_ttl() {
        let base = Duration::hours(24);
        assert_eq!(CacheEntry::adjusted_ttl(base, 90), Duration::hours(48));
    }

    #[test]
    fn low_quality_halves_ttl() {
        let base = Duration::hours(24);
        assert_eq!(CacheEntry::adjusted_ttl(base, 10), Duration::hours(12));
    }

    #[test]
    fn mid_quality_keeps_base_ttl() {
        let base = Duration::hours(24);
        assert_eq!(CacheEntry::adjusted_ttl(base, 60), base);
    }

    #[test]
    fn expired_entry_detected_past_ttl() {
        let now = Utc::now();
        let entry = CacheEntry::new(
            "k",
            serde_json::json!({}),
            now - Duration::hours(25),
            Duration::hours(24),
            CacheTier::T2,
        );
        assert!(entry.is_expired(now));
    }

    #[test]
    fn archive_path_is_year_month_prefixed() {
        let created = DateTime::parse_from_rfc3339("2026-03-05T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            ColdIndexEntry::archive_path_for(created, "search:isbn:9780439708180"),
            "2026/03/search:isbn:9780439708180"
        );
    }
}
