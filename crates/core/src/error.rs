//! Error taxonomy (§7) and its mapping to HTTP status codes.

use crate::types::ErrorCode;
use actix_web::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// The closed set of errors every Biblio Gateway operation can surface.
///
/// `PROVIDER_ERROR` is special: its HTTP status is 502 when an upstream
/// provider responded with an error body, and 503 when the underlying cause
/// was a timeout/rate-limit/unavailable condition (§7). That discrimination
/// is carried explicitly via `upstream_responded`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid ISBN: {isbn}")]
    InvalidIsbn { isbn: String },

    #[error("invalid query")]
    InvalidQuery { details: Option<String> },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid parameter: {name}")]
    InvalidParameter { name: String, details: Option<String> },

    #[error("missing parameter: {name}")]
    MissingParameter { name: String },

    #[error("invalid file type: {content_type}")]
    InvalidFileType { content_type: String },

    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("batch too large: {size} > {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("empty batch")]
    EmptyBatch,

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("file too large: {size} > {max}")]
    FileTooLarge { size: usize, max: usize },

    #[error("not found")]
    NotFound,

    #[error("job not found: {job_id}")]
    JobNotFound { job_id: String },

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("provider timeout: {provider}")]
    ProviderTimeout { provider: String },

    #[error("provider unavailable: {provider}")]
    ProviderUnavailable { provider: String },

    #[error("provider error: {provider}: {message}")]
    ProviderError {
        provider: String,
        message: String,
        /// `true` when the upstream actually responded with an error body
        /// (→ 502); `false` when the cause was timeout/rate-limit/unavailable
        /// surfaced after every fallback was exhausted (→ 503).
        upstream_responded: bool,
    },

    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    #[error("enrichment failed: {0}")]
    EnrichmentFailed(String),

    #[error("internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GatewayError::InvalidIsbn { .. } => ErrorCode::InvalidIsbn,
            GatewayError::InvalidQuery { .. } => ErrorCode::InvalidQuery,
            GatewayError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            GatewayError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            GatewayError::MissingParameter { .. } => ErrorCode::MissingParameter,
            GatewayError::InvalidFileType { .. } => ErrorCode::InvalidFileType,
            GatewayError::InvalidContent(_) => ErrorCode::InvalidContent,
            GatewayError::BatchTooLarge { .. } => ErrorCode::BatchTooLarge,
            GatewayError::EmptyBatch => ErrorCode::EmptyBatch,
            GatewayError::Unauthorized => ErrorCode::Unauthorized,
            GatewayError::InvalidToken => ErrorCode::InvalidToken,
            GatewayError::TokenExpired => ErrorCode::TokenExpired,
            GatewayError::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            GatewayError::NotFound => ErrorCode::NotFound,
            GatewayError::JobNotFound { .. } => ErrorCode::JobNotFound,
            GatewayError::RateLimitExceeded { .. } => ErrorCode::RateLimitExceeded,
            GatewayError::ProviderTimeout { .. } => ErrorCode::ProviderTimeout,
            GatewayError::ProviderUnavailable { .. } => ErrorCode::ProviderUnavailable,
            GatewayError::ProviderError { .. } => ErrorCode::ProviderError,
            GatewayError::ProcessingFailed(_) => ErrorCode::ProcessingFailed,
            GatewayError::EnrichmentFailed(_) => ErrorCode::EnrichmentFailed,
            GatewayError::InternalError(_) => ErrorCode::InternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidIsbn { .. }
            | GatewayError::InvalidQuery { .. }
            | GatewayError::InvalidRequest(_)
            | GatewayError::InvalidParameter { .. }
            | GatewayError::MissingParameter { .. }
            | GatewayError::InvalidFileType { .. }
            | GatewayError::InvalidContent(_)
            | GatewayError::BatchTooLarge { .. }
            | GatewayError::EmptyBatch => StatusCode::BAD_REQUEST,

            GatewayError::Unauthorized
            | GatewayError::InvalidToken
            | GatewayError::TokenExpired => StatusCode::UNAUTHORIZED,

            GatewayError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            GatewayError::NotFound | GatewayError::JobNotFound { .. } => StatusCode::NOT_FOUND,

            GatewayError::RateLimitExceeded { .. }
            | GatewayError::ProviderTimeout { .. }
            | GatewayError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,

            GatewayError::ProviderError {
                upstream_responded, ..
            } => {
                if *upstream_responded {
                    StatusCode::BAD_GATEWAY
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            }

            GatewayError::ProcessingFailed(_)
            | GatewayError::EnrichmentFailed(_)
            | GatewayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured `error.details` payload for the response envelope (§4.10).
    pub fn details(&self) -> Option<Value> {
        match self {
            GatewayError::InvalidIsbn { isbn } => Some(serde_json::json!({ "isbn": isbn })),
            GatewayError::InvalidQuery { details } => {
                details.as_ref().map(|d| serde_json::json!({ "reason": d }))
            }
            GatewayError::InvalidParameter { name, details } => Some(serde_json::json!({
                "parameter": name,
                "reason": details,
            })),
            GatewayError::MissingParameter { name } => {
                Some(serde_json::json!({ "parameter": name }))
            }
            GatewayError::InvalidFileType { content_type } => {
                Some(serde_json::json!({ "contentType": content_type }))
            }
            GatewayError::BatchTooLarge { size, max } => {
                Some(serde_json::json!({ "size": size, "max": max }))
            }
            GatewayError::FileTooLarge { size, max } => {
                Some(serde_json::json!({ "size": size, "max": max }))
            }
            GatewayError::JobNotFound { job_id } => Some(serde_json::json!({ "jobId": job_id })),
            _ => None,
        }
    }
}

impl actix_web::ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        GatewayError::status_code(self)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let envelope = crate::envelope::Envelope::<()>::error(
            self.to_string(),
            Some(self.code()),
            self.details(),
        );
        let mut builder = actix_web::HttpResponse::build(self.status_code());
        if let GatewayError::RateLimitExceeded { retry_after_secs } = self {
            builder.insert_header(("Retry-After", retry_after_secs.to_string()));
        }
        builder.insert_header(("X-Error-Code", self.code().as_str()));
        builder.json(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_isbn_maps_to_400() {
        let err = GatewayError::InvalidIsbn {
            isbn: "123".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::InvalidIsbn);
    }

    #[test]
    fn provider_error_discriminates_status_by_upstream_responded() {
        let responded = GatewayError::ProviderError {
            provider: "isbndb".into(),
            message: "malformed".into(),
            upstream_responded: true,
        };
        assert_eq!(responded.status_code(), StatusCode::BAD_GATEWAY);

        let not_responded = GatewayError::ProviderError {
            provider: "isbndb".into(),
            message: "timeout".into(),
            upstream_responded: false,
        };
        assert_eq!(not_responded.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn job_not_found_is_404_not_generic_not_found() {
        let err = GatewayError::JobNotFound {
            job_id: "abc".into(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), ErrorCode::JobNotFound);
    }
}
