//! Application layer - the categorization and extraction pipeline plus the
//! services that orchestrate it.

pub mod cache_service;
pub mod catalog_service;
pub mod classifier;
pub mod extractor;
pub mod taxonomy;

pub use cache_service::CacheService;
pub use catalog_service::{CatalogService, ListingRequest};
pub use taxonomy::TaxonomyService;
