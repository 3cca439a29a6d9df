//! Stock oracle and product catalog.
//!
//! # Architecture
//!
//! - [`StockOracle`] and [`ProductCatalog`] are the seams the cart service
//!   depends on; tests substitute in-memory fakes
//! - [`ApiClient`] implements both over the storefront's JSON API using `reqwest`
//! - Product metadata is cached via `moka`; stock is always fetched live
//!
//! # Endpoints
//!
//! - `GET /stock/{id}` - `{ "id": 1, "amount": 3 }`
//! - `GET /products/{id}` - `{ "id": 1, "title": "...", "price": 179.9, "image": "..." }`
//! - `GET /products` - array of products
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_storefront::catalog::{ApiClient, StockOracle};
//!
//! let client = ApiClient::new(&config.api)?;
//! let available = client.available(ProductId::new(1)).await?;
//! ```

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{CatalogProduct, Stock};

use async_trait::async_trait;
use rocketshoes_core::ProductId;
use thiserror::Error;

/// Errors that can occur when talking to the stock and catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot carry path segments.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Reports how many units of a product are available right now.
#[async_trait]
pub trait StockOracle: Send + Sync {
    /// Available quantity for `id` at query time.
    ///
    /// A response without a quantity counts as zero availability.
    async fn available(&self, id: ProductId) -> Result<u32, ApiError>;
}

/// Looks up product metadata.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Metadata for a single product.
    async fn product(&self, id: ProductId) -> Result<CatalogProduct, ApiError>;

    /// Every product on sale, in catalog order.
    async fn products(&self) -> Result<Vec<CatalogProduct>, ApiError>;
}
