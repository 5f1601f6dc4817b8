//! The atomic per-identity rate limiter (C9, §4.9): a fixed window counter
//! per identity (client IP), persisted in Redis with TTL equal to the
//! window. A per-identity in-process lock guarantees no racing
//! read-then-write for the same identity across concurrent requests on
//! this process; Redis's atomic `INCR` is the cross-process guarantee.

use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the window resets.
    pub reset_seconds: u64,
}

pub struct RateLimiter {
    conn: redis::aio::ConnectionManager,
    window: Duration,
    limit: u32,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RateLimiter {
    pub fn new(conn: redis::aio::ConnectionManager, window: Duration, limit: u32) -> Self {
        Self { conn, window, limit, locks: Mutex::new(HashMap::new()) }
    }

    async fn lock_for(&self, identity: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(identity.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// `checkAndIncrement()`: atomically reads the counter for `identity`,
    /// rejects if it is already at or above the limit, otherwise
    /// increments and persists. Fails open on any internal error (§4.9):
    /// callers must treat `Err` as "allow and log", never as a rejection.
    pub async fn check_and_increment(&self, identity: &str) -> Result<RateLimitDecision, redis::RedisError> {
        let identity_lock = self.lock_for(identity).await;
        let _guard = identity_lock.lock().await;

        let key = format!("ratelimit:{identity}");
        let mut conn = self.conn.clone();

        let count: u32 = conn.incr(&key, 1u32).await?;
        if count == 1 {
            let _: () = conn.expire(&key, self.window.as_secs() as i64).await?;
        }

        let reset_seconds: i64 = conn.ttl(&key).await?;
        let reset_seconds = reset_seconds.max(0) as u64;

        if count > self.limit {
            Ok(RateLimitDecision { allowed: false, limit: self.limit, remaining: 0, reset_seconds })
        } else {
            Ok(RateLimitDecision { allowed: true, limit: self.limit, remaining: self.limit - count, reset_seconds })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_reports_zero_remaining_when_rejected() {
        let decision = RateLimitDecision { allowed: false, limit: 10, remaining: 0, reset_seconds: 42 };
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }
}
