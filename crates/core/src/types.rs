//! Core enums shared across the data model.

use serde::{Deserialize, Serialize};

/// Physical/delivery format of an [`crate::models::edition::Edition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Hardcover,
    Paperback,
    MassMarket,
    Ebook,
    Audiobook,
}

impl Format {
    /// Sort rank used by the editions-search ranking (§6):
    /// hardcover → paperback → e-book → audiobook.
    pub fn rank(&self) -> u8 {
        match self {
            Format::Hardcover => 0,
            Format::Paperback => 1,
            Format::MassMarket => 1,
            Format::Ebook => 2,
            Format::Audiobook => 3,
        }
    }
}

/// An [`crate::models::author::Author`]'s gender. `Unknown` is the bottom
/// value, never a failure (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
    #[default]
    Unknown,
}

impl Gender {
    /// Parses a free-text gender label as returned by a knowledge-base
    /// lookup (case-insensitive). Anything unrecognized — including an
    /// empty label — is `Unknown`, never a failure (§3, §4.3).
    pub fn from_label(label: &str) -> Gender {
        match label.trim().to_lowercase().as_str() {
            "male" | "man" | "m" => Gender::Male,
            "female" | "woman" | "f" => Gender::Female,
            "non-binary" | "nonbinary" | "non_binary" | "enby" => Gender::NonBinary,
            "" | "unknown" => Gender::Unknown,
            _ => Gender::Other,
        }
    }
}

/// Fixed 11-element cultural-region enumeration (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CulturalRegion {
    NorthAmerica,
    LatinAmerica,
    WesternEurope,
    EasternEurope,
    SubSaharanAfrica,
    MiddleEastNorthAfrica,
    SouthAsia,
    EastAsia,
    SoutheastAsia,
    Oceania,
    Other,
}

/// Review status of a [`crate::models::work::Work`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Verified,
    NeedsReview,
    UserEdited,
}

/// Pipeline kind for an asynchronous [`crate::models::job::Job`] (§3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    BatchEnrichment,
    CsvImport,
    AiScan,
}

impl Pipeline {
    /// Wire value used in stream messages and result-store keys (§6).
    pub fn wire_name(&self) -> &'static str {
        match self {
            Pipeline::BatchEnrichment => "batch_enrichment",
            Pipeline::CsvImport => "csv_import",
            Pipeline::AiScan => "ai_scan",
        }
    }

    /// Key prefix used by the results store (§4.8): `{pipeline}-results:{jobId}`.
    pub fn results_prefix(&self) -> &'static str {
        match self {
            Pipeline::BatchEnrichment => "batch-results",
            Pipeline::CsvImport => "csv-results",
            Pipeline::AiScan => "scan-results",
        }
    }
}

/// State of a [`crate::models::job::Job`] (§4.7 state diagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Complete,
    Failed,
    Canceled,
}

impl JobState {
    /// Terminal states are absorbing (I-4).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Complete | JobState::Failed | JobState::Canceled
        )
    }
}

/// The endpoint kind a cache key / TTL policy is keyed on (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    TitleSearch,
    IsbnLookup,
    AuthorSearch,
    EnrichmentResult,
}

impl EndpointKind {
    pub fn key_prefix(&self) -> &'static str {
        match self {
            EndpointKind::TitleSearch => "search:title",
            EndpointKind::IsbnLookup => "search:isbn",
            EndpointKind::AuthorSearch => "author:search",
            EndpointKind::EnrichmentResult => "enrichment",
        }
    }

    /// Base TTL before quality adjustment (§4.4).
    pub fn base_ttl(&self) -> chrono::Duration {
        match self {
            EndpointKind::TitleSearch => chrono::Duration::hours(24),
            EndpointKind::IsbnLookup => chrono::Duration::days(30),
            EndpointKind::AuthorSearch => chrono::Duration::days(7),
            EndpointKind::EnrichmentResult => chrono::Duration::days(90),
        }
    }
}

/// Which cache tier served a read (§3 `tier-of-origin`, I-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheTier {
    T1,
    T2,
    Cold,
    Miss,
}

/// A provider identifier. Kept as a newtype-ish string enum rather than a
/// bare `String` so adapter selection and provenance fields stay typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Isbndb,
    OpenLibrary,
    GoogleBooks,
    Vision,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Isbndb => "isbndb",
            ProviderId::OpenLibrary => "open_library",
            ProviderId::GoogleBooks => "google_books",
            ProviderId::Vision => "vision",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed error-code taxonomy (§7), each mapped to exactly one default HTTP
/// status (PROVIDER_ERROR is the one code whose status is discriminated by
/// message content at the point of construction, see `error::GatewayError`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidIsbn,
    InvalidQuery,
    InvalidRequest,
    InvalidParameter,
    MissingParameter,
    InvalidFileType,
    InvalidContent,
    BatchTooLarge,
    EmptyBatch,
    Unauthorized,
    InvalidToken,
    TokenExpired,
    FileTooLarge,
    NotFound,
    JobNotFound,
    RateLimitExceeded,
    ProviderTimeout,
    ProviderUnavailable,
    ProviderError,
    ProcessingFailed,
    EnrichmentFailed,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidIsbn => "INVALID_ISBN",
            ErrorCode::InvalidQuery => "INVALID_QUERY",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::MissingParameter => "MISSING_PARAMETER",
            ErrorCode::InvalidFileType => "INVALID_FILE_TYPE",
            ErrorCode::InvalidContent => "INVALID_CONTENT",
            ErrorCode::BatchTooLarge => "BATCH_TOO_LARGE",
            ErrorCode::EmptyBatch => "EMPTY_BATCH",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::FileTooLarge => "FILE_TOO_LARGE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::JobNotFound => "JOB_NOT_FOUND",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::ProviderTimeout => "PROVIDER_TIMEOUT",
            ErrorCode::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
            ErrorCode::ProcessingFailed => "PROCESSING_FAILED",
            ErrorCode::EnrichmentFailed => "ENRICHMENT_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_rank_orders_hardcover_first() {
        assert!(Format::Hardcover.rank() < Format::Paperback.rank());
        assert!(Format::Paperback.rank() < Format::Ebook.rank());
        assert!(Format::Ebook.rank() < Format::Audiobook.rank());
    }

    #[test]
    fn gender_default_is_unknown() {
        assert_eq!(Gender::default(), Gender::Unknown);
    }

    #[test]
    fn gender_from_label_is_case_insensitive() {
        assert_eq!(Gender::from_label("Female"), Gender::Female);
        assert_eq!(Gender::from_label("MALE"), Gender::Male);
        assert_eq!(Gender::from_label("non-binary"), Gender::NonBinary);
    }

    #[test]
    fn gender_from_label_falls_back_to_unknown_or_other() {
        assert_eq!(Gender::from_label(""), Gender::Unknown);
        assert_eq!(Gender::from_label("genderfluid"), Gender::Other);
    }

    #[test]
    fn job_state_terminal_states() {
        assert!(JobState::Complete.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Canceled.is_terminal());
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
    }

    #[test]
    fn error_code_strings_match_taxonomy() {
        assert_eq!(ErrorCode::InvalidIsbn.as_str(), "INVALID_ISBN");
        assert_eq!(ErrorCode::RateLimitExceeded.as_str(), "RATE_LIMIT_EXCEEDED");
    }
}
