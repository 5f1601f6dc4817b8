//! The multi-tier cache (C4): edge (T1) → kv (T2) → cold archive index (T3)
//! → background rehydration, per §4.4.

pub mod key_factory;
pub mod multi_tier;
pub mod tiers;
pub mod ttl;

pub use multi_tier::{MultiTierCache, ReadOutcome};
pub use tiers::cold::ColdTier;
pub use tiers::edge::EdgeCache;
pub use tiers::kv::KvTier;
