//! Normalized catalog types exposed to the UI layer, plus the query type
//! whose deterministic signature keys the result cache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

/// The closed set of internal hardware categories.
///
/// Every normalized product carries exactly one of these. Records that
/// match nothing fall back to `Cpu` by design (classification is a
/// filtering aid, not a correctness-critical index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InternalCategory {
    Cpu,
    Gpu,
    Motherboard,
    Ram,
    Storage,
    Psu,
    Case,
    Cooler,
    Monitor,
    Mouse,
    Keyboard,
    Headset,
}

impl InternalCategory {
    pub const ALL: [InternalCategory; 12] = [
        InternalCategory::Cpu,
        InternalCategory::Gpu,
        InternalCategory::Motherboard,
        InternalCategory::Ram,
        InternalCategory::Storage,
        InternalCategory::Psu,
        InternalCategory::Case,
        InternalCategory::Cooler,
        InternalCategory::Monitor,
        InternalCategory::Mouse,
        InternalCategory::Keyboard,
        InternalCategory::Headset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InternalCategory::Cpu => "cpu",
            InternalCategory::Gpu => "gpu",
            InternalCategory::Motherboard => "motherboard",
            InternalCategory::Ram => "ram",
            InternalCategory::Storage => "storage",
            InternalCategory::Psu => "psu",
            InternalCategory::Case => "case",
            InternalCategory::Cooler => "cooler",
            InternalCategory::Monitor => "monitor",
            InternalCategory::Mouse => "mouse",
            InternalCategory::Keyboard => "keyboard",
            InternalCategory::Headset => "headset",
        }
    }

    /// Parse a provider-asserted category token. Only verbatim enum tokens
    /// (case-insensitive) are accepted - this is the highest-trust source
    /// in the classifier, so no fuzziness here.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim().to_lowercase();
        Self::ALL.iter().copied().find(|c| c.as_str() == token)
    }
}

impl fmt::Display for InternalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cross-component compatibility signals extracted alongside the specs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Compatibility {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_factor: Option<String>,
    /// Only populated for PSU records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wattage: Option<u32>,
}

/// The canonical output shape consumed by the UI layer. Serialized in
/// camelCase, matching the storefront's query-parameter convention.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProduct {
    pub id: i64,
    pub name: String,
    /// `"Unknown"` when no brand was detected.
    pub brand: String,
    pub category: InternalCategory,
    pub price: f64,
    /// Primary image URL; empty string when the record has no images.
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Normalized spec name -> value. Keys unique, insertion order
    /// irrelevant (BTreeMap keeps serialization stable).
    pub specs: BTreeMap<String, String>,
    pub in_stock: bool,
    pub compatibility: Compatibility,
}

/// One page of normalized products plus the provider's total-count metadata.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<NormalizedProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// Filter parameters for a product-list request.
///
/// `signature()` is the cache key: field order is fixed, so two identical
/// parameter sets always produce the same signature and two distinct sets
/// never collide.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub page: u32,
    pub per_page: u32,
    pub orderby: Option<String>,
    pub featured: Option<bool>,
    /// Fetch every page by incrementing `page` until a short page or the
    /// provider's total-pages bound is reached.
    pub all_pages: bool,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            search: None,
            page: 1,
            per_page: 24,
            orderby: None,
            featured: None,
            all_pages: false,
        }
    }
}

impl ProductQuery {
    /// Deterministic cache signature in a fixed field order.
    pub fn signature(&self) -> String {
        format!(
            "products:cat={}:q={}:page={}:per={}:order={}:featured={}:all={}",
            self.category_id.map_or(String::from("-"), |id| id.to_string()),
            self.search.as_deref().unwrap_or("-"),
            self.page,
            self.per_page,
            self.orderby.as_deref().unwrap_or("-"),
            self.featured.map_or(String::from("-"), |f| f.to_string()),
            self.all_pages,
        )
    }

    /// Narrowed queries (a search term or an explicit category filter)
    /// skip the cache on read: stale results for a narrowed query are
    /// worse than a slower response. They are still written after fetch.
    pub fn bypasses_cache_read(&self) -> bool {
        self.category_id.is_some() || self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// Failures the UI must be able to tell apart: a genuine provider failure
/// is an error, an empty match is a normal `ProductPage`.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("provider request failed: {0}")]
    Provider(anyhow::Error),
    #[error("provider request budget exhausted, retry shortly")]
    RateLimited,
}
