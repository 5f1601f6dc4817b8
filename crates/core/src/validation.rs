//! Request input validation primitives shared by every route handler.
//!
//! These are plain functions rather than a `validator`-derived struct
//! because the same checks (query length, page size, ISBN shape) are reused
//! across several distinct request DTOs in `biblio-gateway-api`.

use crate::error::GatewayError;
use crate::isbn;

pub const MAX_QUERY_LEN: usize = 500;
pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MAX_BATCH_SIZE: usize = 100;

/// A free-text search query must be non-empty and under [`MAX_QUERY_LEN`]
/// characters. Whitespace-only queries are left to the caller — the
/// search handlers sanitize via `sanitization::sanitize_search_query`
/// before this check runs.
pub fn validate_query(query: &str) -> Result<(), GatewayError> {
    if query.is_empty() {
        return Err(GatewayError::InvalidQuery {
            details: Some("query cannot be empty".to_string()),
        });
    }
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(GatewayError::InvalidQuery {
            details: Some(format!("query too long: max {MAX_QUERY_LEN} characters")),
        });
    }
    Ok(())
}

pub fn validate_page_size(page_size: u32) -> Result<(), GatewayError> {
    if page_size < MIN_PAGE_SIZE {
        return Err(GatewayError::InvalidParameter {
            name: "pageSize".to_string(),
            details: Some(format!("must be at least {MIN_PAGE_SIZE}")),
        });
    }
    if page_size > MAX_PAGE_SIZE {
        return Err(GatewayError::InvalidParameter {
            name: "pageSize".to_string(),
            details: Some(format!("too large: max {MAX_PAGE_SIZE}")),
        });
    }
    Ok(())
}

/// A confidence threshold override (C11 scan endpoint) must fall in [0, 1].
pub fn validate_confidence_threshold(threshold: f32) -> Result<(), GatewayError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(GatewayError::InvalidParameter {
            name: "confidenceThreshold".to_string(),
            details: Some("must be in [0, 1]".to_string()),
        });
    }
    Ok(())
}

pub fn validate_isbn(raw: &str) -> Result<(), GatewayError> {
    if !isbn::is_valid(raw) {
        return Err(GatewayError::InvalidIsbn {
            isbn: raw.to_string(),
        });
    }
    Ok(())
}

/// Batch endpoints (bulk enrichment, CSV import) reject both empty and
/// oversized batches (§7 `EMPTY_BATCH` / `BATCH_TOO_LARGE`).
pub fn validate_batch_size(size: usize) -> Result<(), GatewayError> {
    if size == 0 {
        return Err(GatewayError::EmptyBatch);
    }
    if size > MAX_BATCH_SIZE {
        return Err(GatewayError::BatchTooLarge {
            size,
            max: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}

/// Multipart upload content-type allowlist for the bookshelf-scan endpoint
/// (C11) and the CSV import endpoint (C7).
pub fn validate_content_type(content_type: &str, allowed: &[&str]) -> Result<(), GatewayError> {
    if !allowed.contains(&content_type) {
        return Err(GatewayError::InvalidFileType {
            content_type: content_type.to_string(),
        });
    }
    Ok(())
}

pub fn validate_file_size(size: usize, max: usize) -> Result<(), GatewayError> {
    if size > max {
        return Err(GatewayError::FileTooLarge { size, max });
    }
    Ok(())
}
