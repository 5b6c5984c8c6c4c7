//! HTTP client for the WooCommerce-style commerce REST API.
//!
//! This client only fetches fresh data on cache misses; responses are
//! cached by the application layer. Credentials travel as query
//! parameters, which is how the platform's v3 API authenticates over
//! HTTPS.

use crate::domain::{CatalogProvider, CategoryEntry, ProductQuery, ProviderPage, RawProduct};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, info};

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum retry attempts
const MAX_RETRIES: usize = 3;

/// Backoff cap between attempts
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Taxonomy pages are fetched at this size until a short page appears.
const CATEGORY_PAGE_SIZE: u32 = 100;

/// A failed provider request, split by whether another attempt can help.
enum RequestError {
    Transient(anyhow::Error),
    Fatal(anyhow::Error),
}

impl RequestError {
    fn is_transient(&self) -> bool {
        matches!(self, RequestError::Transient(_))
    }

    fn into_inner(self) -> anyhow::Error {
        match self {
            RequestError::Transient(e) | RequestError::Fatal(e) => e,
        }
    }
}

/// Whether another attempt can change the outcome for this status. Server
/// errors are often transient; client errors are stable for a given
/// request.
fn status_is_transient(status: reqwest::StatusCode) -> bool {
    status.is_server_error()
}

#[derive(Clone)]
pub struct WooClient {
    client: Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

impl WooClient {
    pub fn new(base_url: &str, consumer_key: &str, consumer_secret: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("HwCatalogGateway/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
        }
    }

    /// GET with retry on transport errors and server errors (5xx). Client
    /// errors (4xx) fail immediately; the platform returns stable errors
    /// for bad requests.
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}/wp-json/wc/v3{}", self.base_url, path);
        debug!("Fetching from commerce API: {}", url);

        let retry_strategy = ExponentialBackoff::from_millis(500)
            .max_delay(MAX_BACKOFF)
            .map(jitter)
            .take(MAX_RETRIES);

        let response = RetryIf::spawn(
            retry_strategy,
            || async {
                let response = self
                    .client
                    .get(&url)
                    .query(&[
                        ("consumer_key", self.consumer_key.as_str()),
                        ("consumer_secret", self.consumer_secret.as_str()),
                    ])
                    .query(params)
                    .header("Accept", "application/json")
                    .send()
                    .await
                    .map_err(|e| RequestError::Transient(e.into()))?;

                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                let error_body = response.text().await.unwrap_or_default();
                let err =
                    anyhow::anyhow!("API request failed with status {}: {}", status, error_body);
                if status_is_transient(status) {
                    Err(RequestError::Transient(err))
                } else {
                    Err(RequestError::Fatal(err))
                }
            },
            RequestError::is_transient,
        )
        .await
        .map_err(RequestError::into_inner)
        .with_context(|| format!("Failed to fetch from {}", url))?;

        Ok(response)
    }

    fn product_params(query: &ProductQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("per_page", query.per_page.to_string()),
        ];
        if let Some(id) = query.category_id {
            params.push(("category", id.to_string()));
        }
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }
        if let Some(orderby) = &query.orderby {
            params.push(("orderby", orderby.clone()));
        }
        if let Some(featured) = query.featured {
            params.push(("featured", featured.to_string()));
        }
        params
    }

    /// Pagination metadata from the platform's response headers.
    fn header_u64(response: &Response, name: &str) -> Option<u64> {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

#[async_trait]
impl CatalogProvider for WooClient {
    async fn fetch_products(&self, query: &ProductQuery) -> Result<ProviderPage> {
        let response = self.get("/products", &Self::product_params(query)).await?;

        let total = Self::header_u64(&response, "X-WP-Total");
        let total_pages = Self::header_u64(&response, "X-WP-TotalPages").map(|p| p as u32);

        let records: Vec<RawProduct> = response
            .json()
            .await
            .context("Failed to parse product page JSON")?;

        debug!(count = records.len(), ?total, "product page fetched");
        Ok(ProviderPage { records, total, total_pages })
    }

    async fn fetch_categories(&self) -> Result<Vec<CategoryEntry>> {
        let mut entries = Vec::new();
        let mut page: u32 = 1;

        loop {
            let params = vec![
                ("page", page.to_string()),
                ("per_page", CATEGORY_PAGE_SIZE.to_string()),
            ];
            let response = self.get("/products/categories", &params).await?;
            let batch: Vec<CategoryEntry> = response
                .json()
                .await
                .context("Failed to parse category page JSON")?;

            let short = batch.len() < CATEGORY_PAGE_SIZE as usize;
            entries.extend(batch);
            if short || page >= 20 {
                break;
            }
            page += 1;
        }

        info!(count = entries.len(), "category taxonomy fetched");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = WooClient::new("https://shop.example.com/", "ck_x", "cs_y");
        assert_eq!(client.base_url, "https://shop.example.com");
    }

    #[test]
    fn test_product_params_include_only_set_filters() {
        let query = ProductQuery {
            category_id: Some(15),
            search: Some("ryzen".into()),
            ..Default::default()
        };
        let params = WooClient::product_params(&query);
        assert!(params.contains(&("category", "15".to_string())));
        assert!(params.contains(&("search", "ryzen".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "featured"));
        assert!(!params.iter().any(|(k, _)| *k == "orderby"));
    }

    #[test]
    fn test_product_params_always_paginate() {
        let params = WooClient::product_params(&ProductQuery::default());
        assert!(params.contains(&("page", "1".to_string())));
        assert!(params.contains(&("per_page", "24".to_string())));
    }

    #[test]
    fn test_server_errors_are_transient_client_errors_are_not() {
        use reqwest::StatusCode;
        assert!(status_is_transient(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(status_is_transient(StatusCode::BAD_GATEWAY));
        assert!(status_is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!status_is_transient(StatusCode::NOT_FOUND));
        assert!(!status_is_transient(StatusCode::UNAUTHORIZED));
        assert!(!status_is_transient(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_transient_failures_spend_the_full_retry_budget() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = AtomicUsize::new(0);
        let strategy = ExponentialBackoff::from_millis(1).take(MAX_RETRIES);
        let result: std::result::Result<(), RequestError> = RetryIf::spawn(
            strategy,
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RequestError::Transient(anyhow::anyhow!("status 503")))
            },
            RequestError::is_transient,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn test_fatal_failures_are_not_retried() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = AtomicUsize::new(0);
        let strategy = ExponentialBackoff::from_millis(1).take(MAX_RETRIES);
        let result: std::result::Result<(), RequestError> = RetryIf::spawn(
            strategy,
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RequestError::Fatal(anyhow::anyhow!("status 404")))
            },
            RequestError::is_transient,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
