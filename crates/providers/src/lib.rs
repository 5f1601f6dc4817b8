//! Provider adapters (§4.1): ISBNdb, Open Library, and Google Books catalog
//! lookups, genre canonicalization (§4.2), author cultural enrichment (§4.3),
//! and the rate gate (§4.1) pacing outbound calls per provider.

pub mod adapter;
pub mod cultural_enricher;
pub mod gated;
pub mod genre_normalizer;
pub mod google_books;
pub mod isbndb;
pub mod open_library;
pub mod rate_gate;

pub use adapter::{Lookup, NormalizedRecord, ProviderAdapter, ProviderError};
pub use cultural_enricher::{
    region_from_nationality, CachedLookup, CachingCulturalKnowledgeBase, CulturalContext, CulturalEnrichmentError,
    CulturalKnowledgeBase, HttpCulturalKnowledgeBase,
};
pub use gated::GatedAdapter;
pub use google_books::GoogleBooksAdapter;
pub use isbndb::IsbndbAdapter;
pub use open_library::OpenLibraryAdapter;
pub use rate_gate::RateGate;
