//! The aggregation engine (C5) and parallel enricher (C6): orchestrates
//! provider lookups, merges multi-provider contributions, and runs bounded
//! concurrent enrichment over detected-book batches (§4.5, §4.6).

pub mod engine;
pub mod enrichment;
pub mod merge;

pub use engine::{AggregationEngine, ResolveQuery, ResolvedMany, ResolvedWork};
pub use enrichment::{enrich_all, EnrichedItem};
