//! Prometheus metrics: HTTP request instrumentation, cache tier hit/miss
//! counters (I-6), provider call counters, and job throughput gauges.

use once_cell::sync::Lazy;
use prometheus::{CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

pub static METRICS_REGISTRY: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

const DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

pub struct MetricsRegistry {
    registry: Registry,
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub active_connections: Gauge,
    /// Labels: tier (T1/T2/COLD), endpoint_kind.
    pub cache_hits_total: CounterVec,
    pub cache_misses_total: CounterVec,
    /// Labels: provider, outcome (ok/timeout/rate_limited/error).
    pub provider_calls_total: CounterVec,
    /// Labels: pipeline.
    pub jobs_started_total: CounterVec,
    pub jobs_completed_total: CounterVec,
    pub jobs_failed_total: CounterVec,
    /// Active job-stream WebSocket connections.
    pub active_job_streams: Gauge,
    /// Labels: limiter_key.
    pub rate_limit_rejections_total: CounterVec,
    pub cold_cache_entries: GaugeVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests processed"),
            &["method", "path", "status"],
        )
        .expect("failed to create http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency in seconds")
                .buckets(DURATION_BUCKETS.to_vec()),
            &["method", "path"],
        )
        .expect("failed to create http_request_duration_seconds metric");

        let active_connections = Gauge::new("active_connections", "Number of active HTTP connections")
            .expect("failed to create active_connections metric");

        let cache_hits_total = CounterVec::new(
            Opts::new("cache_hits_total", "Total number of cache hits by tier"),
            &["tier", "endpoint_kind"],
        )
        .expect("failed to create cache_hits_total metric");

        let cache_misses_total = CounterVec::new(
            Opts::new("cache_misses_total", "Total number of cache misses"),
            &["endpoint_kind"],
        )
        .expect("failed to create cache_misses_total metric");

        let provider_calls_total = CounterVec::new(
            Opts::new("provider_calls_total", "Total number of provider adapter calls"),
            &["provider", "outcome"],
        )
        .expect("failed to create provider_calls_total metric");

        let jobs_started_total = CounterVec::new(
            Opts::new("jobs_started_total", "Total number of jobs started"),
            &["pipeline"],
        )
        .expect("failed to create jobs_started_total metric");

        let jobs_completed_total = CounterVec::new(
            Opts::new("jobs_completed_total", "Total number of jobs completed"),
            &["pipeline"],
        )
        .expect("failed to create jobs_completed_total metric");

        let jobs_failed_total = CounterVec::new(
            Opts::new("jobs_failed_total", "Total number of jobs failed"),
            &["pipeline"],
        )
        .expect("failed to create jobs_failed_total metric");

        let active_job_streams = Gauge::new("active_job_streams", "Number of open job-stream WebSocket connections")
            .expect("failed to create active_job_streams metric");

        let rate_limit_rejections_total = CounterVec::new(
            Opts::new("rate_limit_rejections_total", "Total number of requests rejected by the rate limiter"),
            &["limiter_key"],
        )
        .expect("failed to create rate_limit_rejections_total metric");

        let cold_cache_entries = GaugeVec::new(
            Opts::new("cold_cache_entries", "Number of entries currently archived in the cold cache tier"),
            &["endpoint_kind"],
        )
        .expect("failed to create cold_cache_entries metric");

        for collector in [
            Box::new(http_requests_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(cache_hits_total.clone()),
            Box::new(cache_misses_total.clone()),
            Box::new(provider_calls_total.clone()),
            Box::new(jobs_started_total.clone()),
            Box::new(jobs_completed_total.clone()),
            Box::new(jobs_failed_total.clone()),
            Box::new(rate_limit_rejections_total.clone()),
            Box::new(cold_cache_entries.clone()),
        ] {
            registry.register(collector).expect("failed to register metric collector");
        }
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("failed to register http_request_duration_seconds");
        registry
            .register(Box::new(active_connections.clone()))
            .expect("failed to register active_connections");
        registry
            .register(Box::new(active_job_streams.clone()))
            .expect("failed to register active_job_streams");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            active_connections,
            cache_hits_total,
            cache_misses_total,
            provider_calls_total,
            jobs_started_total,
            jobs_completed_total,
            jobs_failed_total,
            active_job_streams,
            rate_limit_rejections_total,
            cold_cache_entries,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub fn record_http_request(method: &str, path: &str, status: &str) {
    METRICS_REGISTRY.http_requests_total.with_label_values(&[method, path, status]).inc();
}

pub fn observe_http_duration(method: &str, path: &str, duration_seconds: f64) {
    METRICS_REGISTRY
        .http_request_duration_seconds
        .with_label_values(&[method, path])
        .observe(duration_seconds);
}

pub fn record_cache_hit(tier: &str, endpoint_kind: &str) {
    METRICS_REGISTRY.cache_hits_total.with_label_values(&[tier, endpoint_kind]).inc();
}

pub fn record_cache_miss(endpoint_kind: &str) {
    METRICS_REGISTRY.cache_misses_total.with_label_values(&[endpoint_kind]).inc();
}

pub fn record_provider_call(provider: &str, outcome: &str) {
    METRICS_REGISTRY.provider_calls_total.with_label_values(&[provider, outcome]).inc();
}

pub fn record_job_started(pipeline: &str) {
    METRICS_REGISTRY.jobs_started_total.with_label_values(&[pipeline]).inc();
}

pub fn record_job_completed(pipeline: &str) {
    METRICS_REGISTRY.jobs_completed_total.with_label_values(&[pipeline]).inc();
}

pub fn record_job_failed(pipeline: &str) {
    METRICS_REGISTRY.jobs_failed_total.with_label_values(&[pipeline]).inc();
}

pub fn record_rate_limit_rejection(limiter_key: &str) {
    METRICS_REGISTRY.rate_limit_rejections_total.with_label_values(&[limiter_key]).inc();
}

/// Serves the aggregated registry in Prometheus text exposition format.
pub async fn metrics_handler() -> actix_web::HttpResponse {
    match METRICS_REGISTRY.gather() {
        Ok(metrics) => actix_web::HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(metrics),
        Err(e) => {
            tracing::error!(error = %e, "failed to gather metrics");
            actix_web::HttpResponse::InternalServerError().body(format!("failed to gather metrics: {e}"))
        }
    }
}

/// Records request count, latency, and active-connection gauge for every
/// request that passes through the app (wraps every route, §11).
pub struct MetricsMiddleware;

impl<S, B> actix_web::dev::Transform<S, actix_web::dev::ServiceRequest> for MetricsMiddleware
where
    S: actix_web::dev::Service<
        actix_web::dev::ServiceRequest,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    S::Future: 'static,
    B: 'static,
{
    type Response = actix_web::dev::ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = MetricsMiddlewareService<S>;
    type InitError = ();
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(MetricsMiddlewareService { service }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: S,
}

impl<S, B> actix_web::dev::Service<actix_web::dev::ServiceRequest> for MetricsMiddlewareService<S>
where
    S: actix_web::dev::Service<
        actix_web::dev::ServiceRequest,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    S::Future: 'static,
    B: 'static,
{
    type Response = actix_web::dev::ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut core::task::Context<'_>) -> core::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: actix_web::dev::ServiceRequest) -> Self::Future {
        let start = std::time::Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        METRICS_REGISTRY.active_connections.inc();
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let duration = start.elapsed().as_secs_f64();
            let status = res.status().as_u16().to_string();

            record_http_request(&method, &path, &status);
            observe_http_duration(&method, &path, duration);
            METRICS_REGISTRY.active_connections.dec();

            Ok(res)
        })
    }
}
