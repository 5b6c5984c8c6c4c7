use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health_handler,
        crate::api::handlers::metrics_handler,
        crate::api::handlers::rate_limit_handler,
        crate::api::handlers::products_handler,
        crate::api::handlers::categories_handler,
        crate::api::handlers::cache_stats_handler
    ),
    components(
        schemas(
            crate::api::handlers::HealthResponse,
            crate::api::handlers::ErrorResponse,
            crate::domain::NormalizedProduct,
            crate::domain::ProductPage,
            crate::domain::InternalCategory,
            crate::domain::Compatibility,
            crate::application::taxonomy::CategoryNode,
            crate::application::cache_service::CacheStats,
            crate::infrastructure::RateLimitStats
        )
    ),
    tags(
        (name = "system", description = "Health checks, metrics, and rate limit status"),
        (name = "catalog", description = "Normalized product listings and category navigation"),
        (name = "cache", description = "Result cache statistics")
    ),
    info(
        title = "Hardware Catalog Gateway API",
        version = "0.1.0",
        description = "REST gateway that normalizes a WooCommerce-style PC hardware catalog: category classification, specification extraction, compatibility signals, and a tiered result cache."
    )
)]
pub struct ApiDoc;
