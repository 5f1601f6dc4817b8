//! Biblio Gateway API - HTTP entry point for the book metadata
//! aggregation and enrichment service.

mod middleware;
mod routes;
mod state;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use biblio_gateway_cache::multi_tier::MultiTierCache;
use biblio_gateway_cache::tiers::cold::ColdTier;
use biblio_gateway_cache::tiers::edge::EdgeCache;
use biblio_gateway_cache::tiers::kv::KvTier;
use biblio_gateway_core::config::{AppConfig, ConfigLoader};
use biblio_gateway_core::{metrics_handler, MetricsMiddleware};
use biblio_gateway_jobs::{JobRegistry, ResultsStore};
use biblio_gateway_providers::cultural_enricher::{CachingCulturalKnowledgeBase, HttpCulturalKnowledgeBase};
use biblio_gateway_providers::gated::GatedAdapter;
use biblio_gateway_providers::google_books::GoogleBooksAdapter;
use biblio_gateway_providers::isbndb::IsbndbAdapter;
use biblio_gateway_providers::open_library::OpenLibraryAdapter;
use biblio_gateway_providers::rate_gate::RateGate;
use biblio_gateway_ratelimit::RateLimiter;
use biblio_gateway_vision::HttpVisionAdapter;
use middleware::{rate_limit::RateLimitMiddleware, SecurityHeaders};
use object_store::local::LocalFileSystem;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblio Gateway API",
        version = "1.0.0",
        description = "Multi-provider book metadata aggregation and enrichment service",
        license(name = "MIT")
    ),
    tags(
        (name = "health", description = "Health, readiness, and liveness probes"),
        (name = "search", description = "ISBN, title, and advanced search"),
        (name = "editions", description = "Edition lookup and ranking"),
        (name = "enrichment", description = "Batch work enrichment jobs"),
        (name = "scan", description = "Bookshelf image scan jobs"),
        (name = "csv-import", description = "CSV catalog import jobs"),
        (name = "jobs", description = "Job progress stream")
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    biblio_gateway_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = AppConfig::from_env().map_err(|e| std::io::Error::other(e.to_string()))?;

    info!(host = %config.service.host, port = config.service.port, "starting biblio-gateway-api");

    let state = build_state(config.clone())
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let state = web::Data::new(state);

    let openapi = ApiDoc::openapi();
    let host = config.service.host.clone();
    let port = config.service.port;
    let workers = config.service.workers;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(32 * 1024 * 1024))
            .wrap(SecurityHeaders)
            .wrap(MetricsMiddleware)
            .wrap(RateLimitMiddleware)
            .wrap(Cors::permissive())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
            .route("/health", web::get().to(health_check))
            .route("/ready", web::get().to(readiness_check))
            .route("/liveness", web::get().to(liveness_check))
            .route("/metrics", web::get().to(metrics_handler))
            .configure(routes::configure)
    })
    .workers(workers)
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    let server_handle = server.handle();
    let shutdown_handle = server_handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, draining connections");
        shutdown_handle.stop(true).await;
    });

    server.await
}

async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let redis_client = redis::Client::open(config.redis.url.clone())?;
    let redis = redis::aio::ConnectionManager::new(redis_client).await?;

    let db = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.connect_timeout)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let edge = Arc::new(EdgeCache::new(config.cache.edge_capacity));
    let kv = Arc::new(KvTier::new(redis.clone()));
    let archive: Arc<dyn object_store::ObjectStore> =
        Arc::new(LocalFileSystem::new_with_prefix(&config.cache.cold_archive_root)?);
    let cold = Arc::new(ColdTier::new(kv.clone(), archive));
    let cache = Arc::new(MultiTierCache::new(edge, kv, cold));

    let rate_gate = Arc::new(RateGate::new(redis.clone(), config.providers.min_call_interval));

    let isbndb = GatedAdapter::new(
        IsbndbAdapter::new(config.providers.isbndb_api_key.clone().unwrap_or_default()),
        rate_gate.clone(),
    );
    let google_books = GatedAdapter::new(
        GoogleBooksAdapter::new(config.providers.google_books_api_key.clone()),
        rate_gate.clone(),
    );

    let cultural_kb = Arc::new(CachingCulturalKnowledgeBase::new(
        Arc::new(HttpCulturalKnowledgeBase::new(config.providers.cultural_kb_base_url.clone())),
        redis.clone(),
    ));

    let engine = Arc::new(biblio_gateway_aggregation::engine::AggregationEngine::new(
        Arc::new(isbndb),
        Arc::new(OpenLibraryAdapter::default()),
        Arc::new(google_books),
        Arc::new(OpenLibraryAdapter::default()),
        cultural_kb,
        config.aggregation.genre_fuzzy_threshold,
    ));

    let rate_limiter = Arc::new(RateLimiter::new(
        redis.clone(),
        config.rate_limit.window,
        config.rate_limit.limit_per_window,
    ));

    let jobs = Arc::new(JobRegistry::new());
    let results = Arc::new(ResultsStore::new(redis.clone()));

    let vision_endpoint = config.aggregation.vision_endpoint.clone().unwrap_or_default();
    let vision: Arc<dyn biblio_gateway_vision::VisionAdapter> = Arc::new(HttpVisionAdapter::new(vision_endpoint));

    Ok(AppState { config, engine, cache, rate_limiter, jobs, results, vision, db, redis })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "biblio-gateway-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn readiness_check(state: web::Data<AppState>) -> HttpResponse {
    let mut redis_conn = state.redis.clone();
    let redis_ok = redis::cmd("PING")
        .query_async::<_, String>(&mut redis_conn)
        .await
        .is_ok();
    let db_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    let ready = redis_ok && db_ok;
    let status_code = if ready {
        actix_web::http::StatusCode::OK
    } else {
        actix_web::http::StatusCode::SERVICE_UNAVAILABLE
    };

    HttpResponse::build(status_code).json(serde_json::json!({
        "ready": ready,
        "checks": { "database": db_ok, "redis": redis_ok },
    }))
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "alive",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
