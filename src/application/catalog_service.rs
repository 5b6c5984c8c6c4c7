//! Product listing orchestration.
//!
//! Ties the pipeline together for one request: resolve the UI category
//! slug, consult the result cache, spend rate-limit budget, fetch raw
//! pages from the provider, then classify and extract each record into
//! the normalized shape. Cache writes go through the generation gate so a
//! listing superseded mid-fetch never lands.

use crate::application::cache_service::{ttl, CacheService};
use crate::application::classifier::{self, ClassifyOptions};
use crate::application::extractor;
use crate::application::taxonomy::TaxonomyService;
use crate::domain::{
    CatalogError, CatalogProvider, InternalCategory, NormalizedProduct, ProductPage, ProductQuery,
    RawProduct, StockStatus,
};
use crate::infrastructure::rate_limiter::RateLimiter;
use std::sync::Arc;
use tracing::{debug, info};

/// Upper bound on the `all_pages` fetch loop, independent of what the
/// provider reports.
const MAX_PAGES: u32 = 50;

/// One product-listing request as it arrives from the UI, before the
/// category slug has been resolved against the taxonomy.
#[derive(Debug, Clone, Default)]
pub struct ListingRequest {
    pub category_slug: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub orderby: Option<String>,
    pub featured: Option<bool>,
    pub all_pages: bool,
}

pub struct CatalogService {
    provider: Arc<dyn CatalogProvider>,
    cache: Arc<CacheService>,
    taxonomy: Arc<TaxonomyService>,
    limiter: RateLimiter,
}

impl CatalogService {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        cache: Arc<CacheService>,
        taxonomy: Arc<TaxonomyService>,
        limiter: RateLimiter,
    ) -> Self {
        Self { provider, cache, taxonomy, limiter }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Serve one product listing.
    ///
    /// A category slug that resolves to nothing yields an empty page, not
    /// an error; only provider failures and an exhausted request budget
    /// surface as `Err`.
    pub async fn list_products(&self, request: ListingRequest) -> Result<ProductPage, CatalogError> {
        // Browsing the cooler facet itself disables the CPU-cooler and
        // case-fan exclusion filter.
        let include_cpu_coolers = request
            .category_slug
            .as_deref()
            .and_then(classifier::lookup_slug)
            == Some(InternalCategory::Cooler);

        let category_id = match request.category_slug.as_deref() {
            Some(slug) => {
                match self
                    .taxonomy
                    .resolve_category_id(slug)
                    .await
                    .map_err(CatalogError::Provider)?
                {
                    Some(id) => Some(id),
                    None => {
                        debug!(slug, "unresolved category slug, serving empty page");
                        return Ok(ProductPage { products: Vec::new(), total_count: Some(0) });
                    }
                }
            }
            None => None,
        };

        let defaults = ProductQuery::default();
        let query = ProductQuery {
            category_id,
            search: request.search.filter(|s| !s.trim().is_empty()),
            page: request.page.unwrap_or(defaults.page).max(1),
            per_page: request.per_page.unwrap_or(defaults.per_page).clamp(1, 100),
            orderby: request.orderby,
            featured: request.featured,
            all_pages: request.all_pages,
        };
        let signature = query.signature();

        // Narrowed queries skip the cache on read but are still written
        // below, so repeat visits within the TTL get warmed anyway. Since
        // they always refetch, any older fetch still in flight for the
        // same signature is stale the moment this one starts; superseding
        // it keeps a slow older response from landing over this result.
        if query.bypasses_cache_read() {
            self.cache.supersede(&signature);
        } else if let Some(page) = self.cache.get::<ProductPage>(&signature, ttl::PRODUCTS_SECS) {
            return Ok(page);
        }

        let token = self.cache.begin(&signature);
        let (records, total) = self.fetch_records(&query).await?;

        let options = ClassifyOptions { include_cpu_coolers };
        let products: Vec<NormalizedProduct> =
            records.iter().filter_map(|r| normalize_record(r, &options)).collect();

        info!(
            signature,
            raw = records.len(),
            kept = products.len(),
            "listing normalized"
        );
        metrics::counter!("products_normalized_total").increment(products.len() as u64);

        let page = ProductPage { products, total_count: total };
        self.cache.put_if_current(&signature, &page, token);
        Ok(page)
    }

    pub fn cache_stats(&self) -> crate::application::cache_service::CacheStats {
        self.cache.stats()
    }

    /// Fetch one page, or every page up to `MAX_PAGES` when `all_pages`
    /// is set. Each provider call spends one unit of rate-limit budget.
    async fn fetch_records(
        &self,
        query: &ProductQuery,
    ) -> Result<(Vec<RawProduct>, Option<u64>), CatalogError> {
        let mut records = Vec::new();
        let mut total = None;
        let mut page = query.page;

        loop {
            if !self.limiter.check_and_record().await {
                return Err(CatalogError::RateLimited);
            }

            let current = ProductQuery { page, ..query.clone() };
            let fetched = self
                .provider
                .fetch_products(&current)
                .await
                .map_err(CatalogError::Provider)?;

            let batch = fetched.records.len();
            total = fetched.total.or(total);
            records.extend(fetched.records);

            if !query.all_pages || batch < query.per_page as usize {
                break;
            }
            if fetched.total_pages.is_some_and(|tp| page >= tp) {
                break;
            }
            page += 1;
            if page > MAX_PAGES {
                debug!(signature = query.signature(), "pagination cap reached");
                break;
            }
        }

        Ok((records, total))
    }
}

/// Classify and extract one raw record. `None` drops the record entirely
/// (unpublished, or excluded by the cooler post-filter).
fn normalize_record(record: &RawProduct, options: &ClassifyOptions) -> Option<NormalizedProduct> {
    let category = classifier::classify(record, options)?;

    let image = record.images.first().map(|i| i.src.clone()).unwrap_or_default();
    let images = if record.images.len() > 1 {
        Some(record.images.iter().map(|i| i.src.clone()).collect())
    } else {
        None
    };

    Some(NormalizedProduct {
        id: record.id,
        name: record.name.clone(),
        brand: extractor::detect_brand(&record.name),
        category,
        price: record.effective_price(),
        image,
        images,
        specs: extractor::extract_specs(record, category),
        in_stock: record.stock_status == StockStatus::Instock
            || record.stock_quantity.is_some_and(|q| q > 0),
        compatibility: extractor::extract_compatibility(record, category),
    })
}
