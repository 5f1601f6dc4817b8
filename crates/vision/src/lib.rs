//! The bookshelf-scan vision adapter (C1). The vision model itself is a
//! black box; this crate only shapes the request/response boundary around
//! it into [`biblio_gateway_core::models::detected_book::DetectedBook`].

pub mod adapter;

pub use adapter::{HttpVisionAdapter, VisionAdapter, VisionError};
