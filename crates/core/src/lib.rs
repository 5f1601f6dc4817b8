//! # Biblio Gateway Core
//!
//! Core data structures and types shared across the Biblio Gateway platform.
//!
//! This crate provides the canonical data model (Work, Edition, Author,
//! DetectedBook, Job, cache entries), the error taxonomy, the response
//! envelope, configuration loading, and telemetry setup used by every
//! other crate in the workspace.
//!
//! ## Modules
//!
//! - `types`: enums shared across the data model
//! - `models`: domain models (work, edition, author, detected_book, job, cache)
//! - `error`: error types and HTTP status mapping
//! - `envelope`: the uniform success/error response shape (C10)
//! - `config`: `AppConfig`, the `Env` value passed to every operation
//! - `telemetry`: tracing/logging initialization
//! - `metrics`: Prometheus registry, `/metrics` handler, request middleware
//! - `validation` / `sanitization`: request input helpers

pub mod config;
pub mod envelope;
pub mod error;
pub mod isbn;
pub mod metrics;
pub mod models;
pub mod sanitization;
pub mod telemetry;
pub mod types;
pub mod validation;

pub use error::GatewayError;
pub use metrics::{metrics_handler, MetricsMiddleware};
pub use models::{author, cache, detected_book, edition, job, work};

/// Result type alias for Biblio Gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
