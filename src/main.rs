//! Hardware Catalog Gateway
//!
//! A REST API gateway that turns a WooCommerce-style PC hardware catalog
//! into normalized, UI-ready data: internal category classification,
//! specification extraction, compatibility signals, and a tiered result
//! cache in front of the commerce provider.
//!
//! # Architecture
//!
//! The gateway follows clean/onion architecture with clear separation of
//! concerns:
//! - **Domain**: Raw and normalized catalog entities, boundary traits
//! - **Application**: Classifier, extractor, taxonomy, cache, orchestration
//! - **Infrastructure**: Commerce REST client, Parquet cache tier, limiter
//! - **API**: HTTP handlers, routing, and middleware
//!
//! # Configuration
//!
//! Configured via `config.yaml` and environment variables:
//! - `WOO_CONSUMER_KEY` / `WOO_CONSUMER_SECRET`: provider API credentials
//! - `PROVIDER_BASE_URL`: overrides the configured provider URL
//! - `CACHE_PATH`: persisted cache directory (default: data/cache)
//! - `RUST_LOG`: logging level (default: info)
//! - `LOG_FORMAT`: "text" or "json"
//!
//! # Quick Start
//!
//! ```bash
//! export WOO_CONSUMER_KEY="ck_..."
//! export WOO_CONSUMER_SECRET="cs_..."
//!
//! cargo run --release
//!
//! curl http://localhost:3020/health
//! curl "http://localhost:3020/v1/api/catalog/products?category=graphic-cards"
//! ```

mod api;
mod application;
mod domain;
mod infrastructure;

use crate::api::routes::create_router;
use crate::api::state::AppState;
use crate::application::{CacheService, CatalogService, TaxonomyService};
use crate::domain::{CatalogProvider, Clock, SystemClock};
use crate::infrastructure::{DiskStore, RateLimiter, WooClient};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Top-level application configuration loaded from `config.yaml`.
#[derive(Deserialize, Debug, Clone)]
struct Config {
    server: ServerConfig,
    #[serde(default)]
    rate_limit: RateLimitConfig,
    provider: ProviderConfig,
    #[serde(default)]
    cache: CacheConfig,
}

/// Server configuration settings.
#[derive(Deserialize, Debug, Clone)]
struct ServerConfig {
    /// Host address to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    host: String,
    /// Port number to listen on (default: 3020)
    #[serde(default = "default_port")]
    port: u16,
    /// Comma-separated list of allowed CORS origins (default: "*")
    #[serde(default = "default_allowed_origins")]
    allowed_origins: String,
}

/// Rate limiting configuration for outbound provider requests
#[derive(Deserialize, Debug, Clone, Default)]
struct RateLimitConfig {
    /// Maximum provider requests per minute
    #[serde(default = "default_requests_per_minute")]
    requests_per_minute: u32,
}

/// Commerce provider configuration
#[derive(Deserialize, Debug, Clone)]
struct ProviderConfig {
    /// Base URL of the WooCommerce-style store
    base_url: String,
}

/// Persisted cache tier configuration
#[derive(Deserialize, Debug, Clone)]
struct CacheConfig {
    #[serde(default = "default_cache_path")]
    path: String,
    #[serde(default = "default_cache_max_size")]
    max_size_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { path: default_cache_path(), max_size_bytes: default_cache_max_size() }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3020
}
fn default_allowed_origins() -> String {
    "*".to_string()
}
fn default_requests_per_minute() -> u32 {
    60
}
fn default_cache_path() -> String {
    "data/cache".to_string()
}
fn default_cache_max_size() -> u64 {
    256 * 1024 * 1024
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter =
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load Config
    let config_content = fs::read_to_string("config.yaml")
        .context("Failed to read config.yaml - ensure file exists in working directory")?;
    let config: Config = serde_yaml::from_str(&config_content)
        .context("Failed to parse config.yaml - check YAML syntax and structure")?;

    let consumer_key = env::var("WOO_CONSUMER_KEY")
        .context("WOO_CONSUMER_KEY not set - provider credentials are required")?;
    let consumer_secret = env::var("WOO_CONSUMER_SECRET")
        .context("WOO_CONSUMER_SECRET not set - provider credentials are required")?;
    let base_url = env::var("PROVIDER_BASE_URL").unwrap_or(config.provider.base_url.clone());

    // Metrics recorder is installed once; handlers render from the handle.
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    // Infrastructure
    let cache_path = env::var("CACHE_PATH").unwrap_or(config.cache.path.clone());
    let disk_store = Arc::new(DiskStore::new(&cache_path, config.cache.max_size_bytes));
    tracing::info!("Persisted cache initialized at: {}", cache_path);

    let rate_limiter = RateLimiter::new(config.rate_limit.requests_per_minute);
    tracing::info!(
        "Rate limiter initialized: {} requests/minute",
        config.rate_limit.requests_per_minute
    );

    let provider: Arc<dyn CatalogProvider> =
        Arc::new(WooClient::new(&base_url, &consumer_key, &consumer_secret));
    tracing::info!("Commerce provider: {}", base_url);

    // Application
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache_service = Arc::new(CacheService::new(disk_store, clock.clone()));
    let taxonomy_service =
        Arc::new(TaxonomyService::new(provider.clone(), cache_service.clone(), clock));
    let catalog_service = Arc::new(CatalogService::new(
        provider,
        cache_service,
        taxonomy_service.clone(),
        rate_limiter.clone(),
    ));

    let state = AppState {
        catalog_service,
        taxonomy_service,
        rate_limiter,
        metrics_handle,
    };

    let app = create_router(state, config.server.allowed_origins.clone());

    // Allow PORT env var override
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;
    tracing::info!("Hardware catalog gateway running at http://{}", addr);

    // Graceful shutdown handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error during operation")?;

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C) to initiate graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
