//! The atomic per-identity rate limiter (C9, §4.9).

pub mod limiter;

pub use limiter::{RateLimitDecision, RateLimiter};
