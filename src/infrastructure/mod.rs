//! Infrastructure layer - outbound adapters for the commerce API, the
//! persisted cache tier, and the provider rate limiter.

pub mod disk_store;
pub mod rate_limiter;
pub mod woo_client;

pub use disk_store::DiskStore;
pub use rate_limiter::{RateLimitStats, RateLimiter};
pub use woo_client::WooClient;
