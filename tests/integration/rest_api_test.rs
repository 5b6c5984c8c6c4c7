//! Integration tests for REST API endpoints
//!
//! These tests verify that REST API endpoints work correctly end-to-end.
//! Run with: `cargo test --test rest_api_test -- --ignored`
//!
//! Note: These tests require a running server. Set TEST_BASE_URL environment
//! variable to point to your test server, or use the default
//! http://localhost:3020

use serde_json::Value;

/// Helper function to get base URL from environment or use default
fn get_base_url() -> String {
    std::env::var("TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3020".to_string())
}

/// Helper function to make a GET request
async fn get_request(path: &str) -> Result<reqwest::Response, reqwest::Error> {
    let client = reqwest::Client::new();
    let url = format!("{}{}", get_base_url(), path);
    client.get(&url).send().await
}

#[tokio::test]
#[ignore] // Ignore by default - requires running server
async fn test_health_endpoint() {
    let response = get_request("/health").await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body.get("version").is_some());
}

#[tokio::test]
#[ignore]
async fn test_metrics_endpoint() {
    let response = get_request("/metrics").await.unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("http_responses_total") || body.contains("# HELP"));
}

#[tokio::test]
#[ignore]
async fn test_rate_limit_endpoint() {
    let response = get_request("/rate-limit").await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body.get("limit").is_some());
    assert!(body.get("remaining").is_some());
}

#[tokio::test]
#[ignore]
async fn test_products_endpoint() {
    let response = get_request("/v1/api/catalog/products").await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body["products"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_products_with_category() {
    let response = get_request("/v1/api/catalog/products?category=graphic-cards")
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    for product in body["products"].as_array().unwrap() {
        assert_eq!(product["category"], "gpu");
        assert!(product["specs"].is_object());
    }
}

#[tokio::test]
#[ignore]
async fn test_products_unknown_category_is_empty_not_error() {
    let response = get_request("/v1/api/catalog/products?category=definitely-not-a-category")
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["products"].as_array().unwrap().len(), 0);
}

#[tokio::test]
#[ignore]
async fn test_products_invalid_page_is_rejected() {
    let response = get_request("/v1/api/catalog/products?page=0").await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_categories_endpoint() {
    let response = get_request("/v1/api/catalog/categories").await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body.is_array());
    for node in body.as_array().unwrap() {
        assert!(node.get("slug").is_some());
        assert!(node.get("icon").is_some());
        assert!(node["count"].as_i64().unwrap() > 0);
    }
}

#[tokio::test]
#[ignore]
async fn test_cache_stats_endpoint() {
    let response = get_request("/v1/api/catalog/cache/stats").await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body.get("hits").is_some());
    assert!(body.get("misses").is_some());
}
