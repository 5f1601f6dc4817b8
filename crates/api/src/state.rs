//! Shared application state (§9 "ambient context... becomes an explicit
//! `Env` value"): every adapter, cache handle, and tuning knob a route
//! handler needs, constructed once at process start and handed to every
//! worker by `web::Data` / `Arc`.

use biblio_gateway_aggregation::engine::AggregationEngine;
use biblio_gateway_cache::multi_tier::MultiTierCache;
use biblio_gateway_core::config::AppConfig;
use biblio_gateway_jobs::{JobRegistry, ResultsStore};
use biblio_gateway_ratelimit::RateLimiter;
use biblio_gateway_vision::VisionAdapter;
use std::sync::Arc;

pub struct AppState {
    pub config: AppConfig,
    pub engine: Arc<AggregationEngine>,
    pub cache: Arc<MultiTierCache>,
    pub rate_limiter: Arc<RateLimiter>,
    pub jobs: Arc<JobRegistry>,
    pub results: Arc<ResultsStore>,
    pub vision: Arc<dyn VisionAdapter>,
    pub db: sqlx::PgPool,
    pub redis: redis::aio::ConnectionManager,
}
