//! HTTP handlers for the catalog gateway.
//!
//! Listing responses come from the normalization pipeline behind the
//! result cache. A provider outage surfaces as 502; an empty match (or a
//! category slug that resolves to nothing) is a normal 200 with an empty
//! product list, so the storefront can render an empty grid instead of an
//! error state.

use crate::api::state::AppState;
use crate::application::cache_service::CacheStats;
use crate::application::taxonomy::CategoryNode;
use crate::application::ListingRequest;
use crate::domain::{CatalogError, ProductPage};
use crate::infrastructure::RateLimitStats;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[allow(unused_imports)]
use serde_json::json; // Used in utoipa::path examples

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error payload for all non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query parameters for the product listing endpoint
#[derive(Debug, Clone, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductsQuery {
    /// Category slug as used by the storefront navigation
    #[param(example = "graphic-cards")]
    #[validate(length(max = 100))]
    pub category: Option<String>,

    /// Free-text search over product names and descriptions
    #[validate(length(max = 200))]
    pub search: Option<String>,

    /// Page number (1-10000)
    #[param(default = 1, minimum = 1, example = 1)]
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u32>,

    /// Products per page (1-100)
    #[param(default = 24, minimum = 1, maximum = 100, example = 24)]
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,

    /// Provider sort order (e.g. "date", "price", "popularity")
    #[validate(length(max = 30))]
    pub orderby: Option<String>,

    /// Only featured products
    pub featured: Option<bool>,

    /// Walk every page instead of one
    #[serde(default)]
    pub all: bool,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    pub cache_entries: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Health check passed", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        backend: "rust-axum-onion".to_string(),
        cache_entries: state.catalog_service.cache_stats().memory_entries,
    })
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "system",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain")
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics_handle.render()
}

/// Current provider request budget.
///
/// Reports the sliding-window budget for outbound provider calls; cache
/// hits never consume it.
#[utoipa::path(
    get,
    path = "/rate-limit",
    tag = "system",
    responses(
        (status = 200, description = "Rate limit status", body = RateLimitStats,
            example = json!({"limit": 60, "used": 12, "remaining": 48, "reset_in_secs": 31}))
    )
)]
#[instrument(skip(state))]
pub async fn rate_limit_handler(State(state): State<AppState>) -> Json<RateLimitStats> {
    Json(state.rate_limiter.stats().await)
}

/// List normalized products.
///
/// Each product carries its internal category, extracted specifications,
/// and compatibility signals. The `category` filter takes storefront
/// slugs and tolerates plural/alias variants.
#[utoipa::path(
    get,
    path = "/v1/api/catalog/products",
    params(ProductsQuery),
    tag = "catalog",
    responses(
        (status = 200, description = "Products retrieved successfully", body = ProductPage),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 429, description = "Provider request budget exhausted", body = ErrorResponse),
        (status = 502, description = "Commerce provider unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(category = ?query.category, search = ?query.search, page = ?query.page))]
pub async fn products_handler(
    Query(query): Query<ProductsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ProductPage>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = query.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: format!("Invalid parameters: {}", e) }),
        ));
    }

    metrics::counter!("api_requests_total", "endpoint" => "products").increment(1);

    let request = ListingRequest {
        category_slug: query.category,
        search: query.search,
        page: query.page,
        per_page: query.per_page,
        orderby: query.orderby,
        featured: query.featured,
        all_pages: query.all,
    };

    match state.catalog_service.list_products(request).await {
        Ok(page) => Ok(Json(page)),
        Err(CatalogError::RateLimited) => Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Provider request budget exhausted, retry shortly".to_string(),
            }),
        )),
        Err(CatalogError::Provider(e)) => {
            tracing::error!("provider failure: {e:#}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse { error: "Commerce provider unavailable".to_string() }),
            ))
        }
    }
}

/// Category navigation tree.
///
/// Root categories with nested children, product counts, and UI icon
/// tokens. Categories with zero products are omitted.
#[utoipa::path(
    get,
    path = "/v1/api/catalog/categories",
    tag = "catalog",
    responses(
        (status = 200, description = "Category tree retrieved successfully", body = [CategoryNode]),
        (status = 502, description = "Commerce provider unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn categories_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryNode>>, (StatusCode, Json<ErrorResponse>)> {
    metrics::counter!("api_requests_total", "endpoint" => "categories").increment(1);

    match state.taxonomy_service.category_tree().await {
        Ok(tree) => Ok(Json(tree)),
        Err(e) => {
            tracing::error!("taxonomy fetch failure: {e:#}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse { error: "Commerce provider unavailable".to_string() }),
            ))
        }
    }
}

/// Result cache counters.
#[utoipa::path(
    get,
    path = "/v1/api/catalog/cache/stats",
    tag = "cache",
    responses(
        (status = 200, description = "Cache statistics", body = CacheStats)
    )
)]
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.catalog_service.cache_stats())
}
