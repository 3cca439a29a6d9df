//! HTTP client for the stock and catalog API.
//!
//! Uses `reqwest` for HTTP and caches product metadata using `moka`.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use rocketshoes_core::ProductId;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::types::{CatalogProduct, Stock};
use super::{ApiError, ProductCatalog, StockOracle};
use crate::config::ApiConfig;

/// Client for the storefront's stock and catalog endpoints.
///
/// Product metadata is cached for the configured TTL. Stock is never cached:
/// every availability check goes to the API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Cache<ProductId, CatalogProduct>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry path segments or the
    /// HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(config.base_url.to_string()));
        }

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                products,
            }),
        })
    }

    /// Fetch the current stock snapshot for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        let url = self.endpoint(&["stock", &id.to_string()])?;
        self.get_json(url).await
    }

    /// Fetch product metadata, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<CatalogProduct, ApiError> {
        if let Some(product) = self.inner.products.get(&id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = self.endpoint(&["products", &id.to_string()])?;
        let product: CatalogProduct = self.get_json(url).await?;
        self.inner.products.insert(id, product.clone()).await;
        Ok(product)
    }

    /// Fetch the full product list and refresh the metadata cache with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<CatalogProduct>, ApiError> {
        let url = self.endpoint(&["products"])?;
        let products: Vec<CatalogProduct> = self.get_json(url).await?;

        for product in &products {
            self.inner.products.insert(product.id, product.clone()).await;
        }
        debug!(count = products.len(), "Fetched product list");

        Ok(products)
    }

    /// Build an endpoint URL by appending path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.inner.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.path().to_string()));
        }

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }
}

#[async_trait]
impl StockOracle for ApiClient {
    async fn available(&self, id: ProductId) -> Result<u32, ApiError> {
        Ok(self.get_stock(id).await?.available())
    }
}

#[async_trait]
impl ProductCatalog for ApiClient {
    async fn product(&self, id: ProductId) -> Result<CatalogProduct, ApiError> {
        self.get_product(id).await
    }

    async fn products(&self) -> Result<Vec<CatalogProduct>, ApiError> {
        self.get_products().await
    }
}
