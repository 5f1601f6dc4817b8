//! Per-provider call pacing (§4.1).
//!
//! Two layers: an in-process [`governor`] token bucket gives every worker a
//! cheap, allocation-free first check; the KV-persisted monotonic
//! timestamp is the cross-process source of truth, since several API
//! workers can be hammering the same provider at once and only Redis sees
//! all of them. A caller must pass both checks before it is clear to call
//! the provider.

use biblio_gateway_core::types::ProviderId;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type InProcessLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Distributed pacing gate for provider calls. `min_call_interval` matches
/// the per-provider throughput terms of the upstream API (§4.1).
pub struct RateGate {
    redis: redis::aio::ConnectionManager,
    min_call_interval: Duration,
    in_process: Mutex<HashMap<ProviderId, Arc<InProcessLimiter>>>,
}

impl RateGate {
    pub fn new(redis: redis::aio::ConnectionManager, min_call_interval: Duration) -> Self {
        Self {
            redis,
            min_call_interval,
            in_process: Mutex::new(HashMap::new()),
        }
    }

    /// Block until both the in-process bucket and the distributed
    /// timestamp allow a call to `provider`, then record the call.
    pub async fn acquire(&self, provider: ProviderId) -> Result<(), redis::RedisError> {
        self.acquire_in_process(provider).await;
        self.acquire_distributed(provider).await
    }

    async fn acquire_in_process(&self, provider: ProviderId) {
        let limiter = {
            let mut guard = self.in_process.lock().await;
            guard
                .entry(provider)
                .or_insert_with(|| Arc::new(RateLimiter::direct(per_provider_quota())))
                .clone()
        };
        limiter.until_ready().await;
    }

    /// The distributed check: read the provider's last-call timestamp from
    /// Redis, sleep out the remainder of `min_call_interval` if needed, then
    /// overwrite the timestamp. A `SET key value EX ttl` with the new
    /// timestamp keeps the key from growing unbounded.
    async fn acquire_distributed(&self, provider: ProviderId) -> Result<(), redis::RedisError> {
        let key = format!("provider:last-call:{}", provider.as_str());
        let mut conn = self.redis.clone();

        loop {
            let last_call_ms: Option<i64> = conn.get(&key).await?;
            let now_ms = now_millis();

            if let Some(last) = last_call_ms {
                let elapsed = now_ms.saturating_sub(last);
                let min_ms = self.min_call_interval.as_millis() as i64;
                if elapsed < min_ms {
                    tokio::time::sleep(Duration::from_millis((min_ms - elapsed) as u64)).await;
                    continue;
                }
            }

            let ttl_secs = (self.min_call_interval.as_secs() + 1) as usize;
            let _: () = conn.set_ex(&key, now_millis(), ttl_secs).await?;
            return Ok(());
        }
    }
}

fn per_provider_quota() -> Quota {
    Quota::per_second(nonzero!(10u32)).allow_burst(NonZeroU32::new(5).unwrap())
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_provider_quota_allows_burst() {
        let quota = per_provider_quota();
        assert_eq!(quota.burst_size().get(), 5);
    }
}
