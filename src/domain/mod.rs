//! Domain layer - Core catalog entities and boundary traits.
//!
//! This module defines the domain model for the hardware catalog gateway:
//! - Raw provider record types as delivered by the commerce REST API
//! - Normalized catalog types consumed by the UI layer
//! - Boundary traits for the provider, the persisted cache tier, and time

pub mod catalog_models;
pub mod woo_models;

pub use catalog_models::*;
pub use woo_models::*;

use async_trait::async_trait;

/// One page of raw records from the provider, with pagination metadata
/// taken from the response headers (`X-WP-Total` / `X-WP-TotalPages`).
#[derive(Debug, Clone, Default)]
pub struct ProviderPage {
    pub records: Vec<RawProduct>,
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
}

/// Boundary trait for the external commerce platform.
///
/// Implementations must be thread-safe (`Send + Sync`) for use in async
/// contexts. See `infrastructure::woo_client::WooClient` for the REST
/// implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch one page of raw product records matching the query.
    ///
    /// # Errors
    ///
    /// - Returns error if the provider is unreachable or responds non-2xx
    ///   after the retry budget is exhausted
    /// - Returns error if the response body is not valid JSON
    async fn fetch_products(&self, query: &ProductQuery) -> anyhow::Result<ProviderPage>;

    /// Fetch the full category taxonomy (all pages).
    async fn fetch_categories(&self) -> anyhow::Result<Vec<CategoryEntry>>;
}

/// A value retrieved from the persisted cache tier, with the timestamp
/// recorded when it was written. TTL checks are the caller's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub value: String,
    pub written_at: i64,
}

/// Boundary trait for the persisted secondary cache store.
///
/// Writes are best-effort from the caller's perspective: `set` may fail
/// when the store is at its size ceiling, in which case the caller evicts
/// and retries once before dropping the write.
pub trait KvStore: Send + Sync {
    /// Retrieve a stored value by key. Never errors on a plain miss.
    fn get(&self, key: &str) -> anyhow::Result<Option<StoredEntry>>;

    /// Store a value under a key with its write timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is at its size ceiling or the
    /// underlying medium rejects the write.
    fn set(&self, key: &str, value: &str, written_at: i64) -> anyhow::Result<()>;

    /// Remove a stored value. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> anyhow::Result<()>;

    /// Purge the oldest `fraction` of entries by write timestamp.
    /// Returns the number of entries removed.
    fn evict_oldest(&self, fraction: f64) -> anyhow::Result<usize>;
}

/// Injected time source so TTL logic is testable without sleeping.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}
