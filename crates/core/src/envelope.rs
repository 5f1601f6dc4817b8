//! Uniform success/error response envelope (C10, §4.10).
//!
//! The presence of `error` is the sole discriminator of success/failure —
//! `data == null` alone never is: a successful search with no hits still
//! serializes as `data: { works: [], editions: [], authors: [] }` with no
//! `error` field.

use crate::types::ErrorCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

impl Default for EnvelopeMetadata {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            processing_time_ms: None,
            provider: None,
            cached: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// `{ data, metadata, error? }` — the only authoritative envelope shape.
/// A legacy `{ success, data, meta }` shape existed in the system this was
/// distilled from; it is not implemented here (open question, §14).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub metadata: EnvelopeMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            metadata: EnvelopeMetadata::default(),
            error: None,
        }
    }

    pub fn success_with_metadata(data: T, metadata: EnvelopeMetadata) -> Self {
        Self {
            data: Some(data),
            metadata,
            error: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.metadata.provider = Some(provider.into());
        self
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.metadata.cached = Some(cached);
        self
    }

    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.metadata.processing_time_ms = Some(ms);
        self
    }
}

impl Envelope<()> {
    pub fn error(
        message: impl Into<String>,
        code: Option<ErrorCode>,
        details: Option<Value>,
    ) -> Self {
        Self {
            data: None,
            metadata: EnvelopeMetadata::default(),
            error: Some(EnvelopeError {
                message: message.into(),
                code: code.map(|c| c.as_str().to_string()),
                details,
            }),
        }
    }
}
