//! Configuration loading for every Biblio Gateway service.
//!
//! All configuration uses the `BIBLIO_GATEWAY_` environment variable prefix,
//! with fallback to the unprefixed common name (`DATABASE_URL`, `REDIS_URL`,
//! `PORT`, ...) where one exists. Override hierarchy: defaults < `.env` <
//! process environment.

use crate::error::GatewayError;
use std::time::Duration;
use url::Url;

/// Standardized load + validate surface for a configuration section.
pub trait ConfigLoader: Sized {
    /// Read this section from environment variables, falling back to
    /// defaults for anything unset.
    fn from_env() -> Result<Self, GatewayError>;

    /// Check value ranges and formats once the section is fully loaded.
    fn validate(&self) -> Result<(), GatewayError>;
}

/// PostgreSQL connection settings (durable job and result storage, §9).
///
/// # Environment Variables
///
/// - `BIBLIO_GATEWAY_DATABASE_URL` / `DATABASE_URL` (required)
/// - `BIBLIO_GATEWAY_DATABASE_MAX_CONNECTIONS` (default: 20)
/// - `BIBLIO_GATEWAY_DATABASE_CONNECT_TIMEOUT` seconds (default: 30)
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/biblio_gateway".to_string(),
            max_connections: 20,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl ConfigLoader for DatabaseConfig {
    fn from_env() -> Result<Self, GatewayError> {
        let url = std::env::var("BIBLIO_GATEWAY_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| config_error("DATABASE_URL or BIBLIO_GATEWAY_DATABASE_URL must be set", "BIBLIO_GATEWAY_DATABASE_URL"))?;

        let max_connections = parse_env_var(
            "BIBLIO_GATEWAY_DATABASE_MAX_CONNECTIONS",
            DatabaseConfig::default().max_connections,
        )?;
        let connect_timeout_secs = parse_env_var("BIBLIO_GATEWAY_DATABASE_CONNECT_TIMEOUT", 30u64)?;

        Ok(Self {
            url,
            max_connections,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), GatewayError> {
        Url::parse(&self.url)
            .map_err(|e| config_error(&format!("invalid DATABASE_URL: {e}"), "BIBLIO_GATEWAY_DATABASE_URL"))?;
        if self.max_connections == 0 {
            return Err(config_error(
                "max_connections must be greater than 0",
                "BIBLIO_GATEWAY_DATABASE_MAX_CONNECTIONS",
            ));
        }
        Ok(())
    }
}

/// Redis connection settings, shared by the T2 cache tier (§4.4), the rate
/// limiter's fixed-window counters (§4.9), and the results store (§4.8).
///
/// # Environment Variables
///
/// - `BIBLIO_GATEWAY_REDIS_URL` / `REDIS_URL` (required)
/// - `BIBLIO_GATEWAY_REDIS_MAX_CONNECTIONS` (default: 10)
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
    pub response_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/0".to_string(),
            max_connections: 10,
            response_timeout: Duration::from_secs(5),
        }
    }
}

impl ConfigLoader for RedisConfig {
    fn from_env() -> Result<Self, GatewayError> {
        let url = std::env::var("BIBLIO_GATEWAY_REDIS_URL")
            .or_else(|_| std::env::var("REDIS_URL"))
            .map_err(|_| config_error("REDIS_URL or BIBLIO_GATEWAY_REDIS_URL must be set", "BIBLIO_GATEWAY_REDIS_URL"))?;
        let max_connections = parse_env_var(
            "BIBLIO_GATEWAY_REDIS_MAX_CONNECTIONS",
            RedisConfig::default().max_connections,
        )?;
        let response_timeout_secs = parse_env_var("BIBLIO_GATEWAY_REDIS_RESPONSE_TIMEOUT", 5u64)?;

        Ok(Self {
            url,
            max_connections,
            response_timeout: Duration::from_secs(response_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), GatewayError> {
        Url::parse(&self.url)
            .map_err(|e| config_error(&format!("invalid REDIS_URL: {e}"), "BIBLIO_GATEWAY_REDIS_URL"))?;
        if self.max_connections == 0 {
            return Err(config_error(
                "max_connections must be greater than 0",
                "BIBLIO_GATEWAY_REDIS_MAX_CONNECTIONS",
            ));
        }
        Ok(())
    }
}

/// HTTP service bind settings.
///
/// # Environment Variables
///
/// - `BIBLIO_GATEWAY_SERVICE_HOST` (default: "0.0.0.0")
/// - `BIBLIO_GATEWAY_SERVICE_PORT` / `PORT` (default: 8080)
/// - `BIBLIO_GATEWAY_SERVICE_WORKERS` (default: CPU count)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub log_level: String,
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: num_cpus::get(),
            log_level: "info".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ConfigLoader for ServiceConfig {
    fn from_env() -> Result<Self, GatewayError> {
        let host = std::env::var("BIBLIO_GATEWAY_SERVICE_HOST")
            .unwrap_or_else(|_| ServiceConfig::default().host);
        let port = parse_env_var("BIBLIO_GATEWAY_SERVICE_PORT", ServiceConfig::default().port)
            .or_else(|_| parse_env_var("PORT", ServiceConfig::default().port))?;
        let workers = parse_env_var(
            "BIBLIO_GATEWAY_SERVICE_WORKERS",
            ServiceConfig::default().workers,
        )?;
        let log_level = std::env::var("BIBLIO_GATEWAY_SERVICE_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| ServiceConfig::default().log_level);
        let request_timeout_secs = parse_env_var("BIBLIO_GATEWAY_SERVICE_REQUEST_TIMEOUT", 60u64)?;

        Ok(Self {
            host,
            port,
            workers,
            log_level,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.port == 0 {
            return Err(config_error("port must be greater than 0", "BIBLIO_GATEWAY_SERVICE_PORT"));
        }
        if self.workers == 0 {
            return Err(config_error("workers must be greater than 0", "BIBLIO_GATEWAY_SERVICE_WORKERS"));
        }
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(config_error(
                &format!("invalid log_level '{}', must be one of: {}", self.log_level, valid.join(", ")),
                "BIBLIO_GATEWAY_SERVICE_LOG_LEVEL",
            ));
        }
        Ok(())
    }
}

/// Per-provider adapter settings (§4.1). One instance per provider; credentials
/// are read lazily so a provider missing its API key can still be skipped
/// rather than failing process startup.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub isbndb_api_key: Option<String>,
    pub google_books_api_key: Option<String>,
    /// Minimum interval between calls to the same provider, enforced via the
    /// KV-persisted monotonic timestamp described in §4.1.
    pub min_call_interval: Duration,
    pub request_timeout: Duration,
    /// Base URL of the author cultural-context knowledge base (§4.3).
    pub cultural_kb_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            isbndb_api_key: None,
            google_books_api_key: None,
            min_call_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(10),
            cultural_kb_base_url: "https://www.wikidata.org/w/rest.php/v1".to_string(),
        }
    }
}

impl ConfigLoader for ProviderConfig {
    fn from_env() -> Result<Self, GatewayError> {
        let min_call_interval_ms = parse_env_var("BIBLIO_GATEWAY_PROVIDER_MIN_INTERVAL_MS", 100u64)?;
        let request_timeout_secs = parse_env_var("BIBLIO_GATEWAY_PROVIDER_TIMEOUT_SECS", 10u64)?;
        Ok(Self {
            isbndb_api_key: std::env::var("BIBLIO_GATEWAY_ISBNDB_API_KEY").ok(),
            google_books_api_key: std::env::var("BIBLIO_GATEWAY_GOOGLE_BOOKS_API_KEY").ok(),
            min_call_interval: Duration::from_millis(min_call_interval_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            cultural_kb_base_url: std::env::var("BIBLIO_GATEWAY_CULTURAL_KB_BASE_URL")
                .unwrap_or_else(|_| ProviderConfig::default().cultural_kb_base_url),
        })
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.request_timeout.as_millis() == 0 {
            return Err(config_error(
                "provider request_timeout must be greater than 0",
                "BIBLIO_GATEWAY_PROVIDER_TIMEOUT_SECS",
            ));
        }
        Ok(())
    }
}

/// In-process (T1) edge cache capacity and tier TTL knobs (§4.4).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub edge_capacity: u64,
    pub cold_archive_root: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            edge_capacity: 10_000,
            cold_archive_root: "/var/lib/biblio-gateway/cold-cache".to_string(),
        }
    }
}

impl ConfigLoader for CacheConfig {
    fn from_env() -> Result<Self, GatewayError> {
        Ok(Self {
            edge_capacity: parse_env_var(
                "BIBLIO_GATEWAY_CACHE_EDGE_CAPACITY",
                CacheConfig::default().edge_capacity,
            )?,
            cold_archive_root: std::env::var("BIBLIO_GATEWAY_CACHE_COLD_ARCHIVE_ROOT")
                .unwrap_or_else(|_| CacheConfig::default().cold_archive_root),
        })
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.edge_capacity == 0 {
            return Err(config_error(
                "edge_capacity must be greater than 0",
                "BIBLIO_GATEWAY_CACHE_EDGE_CAPACITY",
            ));
        }
        Ok(())
    }
}

/// Fixed-window rate limiter settings (§4.9).
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub limit_per_window: u32,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            limit_per_window: 10,
            enabled: true,
        }
    }
}

impl ConfigLoader for RateLimitConfig {
    fn from_env() -> Result<Self, GatewayError> {
        let window_secs = parse_env_var("BIBLIO_GATEWAY_RATE_LIMIT_WINDOW_SECS", 60u64)?;
        Ok(Self {
            window: Duration::from_secs(window_secs),
            limit_per_window: parse_env_var(
                "BIBLIO_GATEWAY_RATE_LIMIT_PER_WINDOW",
                RateLimitConfig::default().limit_per_window,
            )?,
            enabled: parse_env_var("BIBLIO_GATEWAY_RATE_LIMIT_ENABLED", true)?,
        })
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.limit_per_window == 0 {
            return Err(config_error(
                "limit_per_window must be greater than 0",
                "BIBLIO_GATEWAY_RATE_LIMIT_PER_WINDOW",
            ));
        }
        Ok(())
    }
}

/// Aggregation and enrichment tuning (§4.2, §4.3, §4.5, §4.6).
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Acceptance threshold for fuzzy genre matching (C2).
    pub genre_fuzzy_threshold: f64,
    /// Default confidence threshold for scan-detection review routing (C11),
    /// overridable per-request.
    pub detection_confidence_threshold: f32,
    /// Concurrency cap for `enrichAll` batch enrichment (C6).
    pub enrichment_concurrency: usize,
    pub vision_endpoint: Option<String>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            genre_fuzzy_threshold: 0.85,
            detection_confidence_threshold: 0.6,
            enrichment_concurrency: 10,
            vision_endpoint: None,
        }
    }
}

impl ConfigLoader for AggregationConfig {
    fn from_env() -> Result<Self, GatewayError> {
        Ok(Self {
            genre_fuzzy_threshold: parse_env_var(
                "BIBLIO_GATEWAY_GENRE_FUZZY_THRESHOLD",
                AggregationConfig::default().genre_fuzzy_threshold,
            )?,
            detection_confidence_threshold: parse_env_var(
                "BIBLIO_GATEWAY_DETECTION_CONFIDENCE_THRESHOLD",
                AggregationConfig::default().detection_confidence_threshold,
            )?,
            enrichment_concurrency: parse_env_var(
                "BIBLIO_GATEWAY_ENRICHMENT_CONCURRENCY",
                AggregationConfig::default().enrichment_concurrency,
            )?,
            vision_endpoint: std::env::var("BIBLIO_GATEWAY_VISION_ENDPOINT").ok(),
        })
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if !(0.0..=1.0).contains(&self.genre_fuzzy_threshold) {
            return Err(config_error(
                "genre_fuzzy_threshold must be in [0, 1]",
                "BIBLIO_GATEWAY_GENRE_FUZZY_THRESHOLD",
            ));
        }
        if !(0.0..=1.0).contains(&self.detection_confidence_threshold) {
            return Err(config_error(
                "detection_confidence_threshold must be in [0, 1]",
                "BIBLIO_GATEWAY_DETECTION_CONFIDENCE_THRESHOLD",
            ));
        }
        if self.enrichment_concurrency == 0 {
            return Err(config_error(
                "enrichment_concurrency must be greater than 0",
                "BIBLIO_GATEWAY_ENRICHMENT_CONCURRENCY",
            ));
        }
        Ok(())
    }
}

/// The full application configuration, loaded once at process startup and
/// shared read-only via `web::Data` thereafter.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub service: ServiceConfig,
    pub providers: ProviderConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub aggregation: AggregationConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, GatewayError> {
        let config = Self {
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            service: ServiceConfig::from_env()?,
            providers: ProviderConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            aggregation: AggregationConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        self.database.validate()?;
        self.redis.validate()?;
        self.service.validate()?;
        self.providers.validate()?;
        self.cache.validate()?;
        self.rate_limit.validate()?;
        self.aggregation.validate()?;
        Ok(())
    }
}

/// Load `.env` if present. Never fails if the file is absent.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            tracing::warn!(error = %e, "failed to load .env file");
        }
    }
}

fn config_error(message: &str, key: &str) -> GatewayError {
    GatewayError::InvalidRequest(format!("configuration error ({key}): {message}"))
}

fn parse_env_var<T>(key: &str, default: T) -> Result<T, GatewayError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|v| v.parse::<T>().map_err(|e| config_error(&format!("failed to parse {key}: {e}"), key)))
        .unwrap_or(Ok(default))
}
