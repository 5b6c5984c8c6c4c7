use crate::application::{CatalogService, TaxonomyService};
use crate::infrastructure::RateLimiter;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog_service: Arc<CatalogService>,
    pub taxonomy_service: Arc<TaxonomyService>,
    pub rate_limiter: RateLimiter,
    pub metrics_handle: PrometheusHandle,
}
