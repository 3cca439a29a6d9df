//! Integration tests for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! The tests need no external services. [`FakeApi`] serves the stock and
//! catalog endpoints from an `axum` router bound to an ephemeral local port.
//!
//! # Test Categories
//!
//! - `api_client` - HTTP client status handling and caching
//! - `cart_flow` - cart operations end to end through the file store

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

/// How the fake answers a stock request for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockReply {
    /// `{"id": .., "amount": n}`
    Amount(u32),
    /// `{"id": ..}` with no amount field
    MissingAmount,
    /// 500 with a plain-text body
    ServerError,
    /// 429 with the given `Retry-After`
    RateLimited(u64),
}

#[derive(Default)]
struct FakeApiState {
    stock: HashMap<i32, StockReply>,
    products: Vec<Value>,
    latency: Option<Duration>,
}

/// In-process stand-in for the stock and catalog API.
///
/// Unknown product ids answer 404 on both `/stock/{id}` and `/products/{id}`.
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<RwLock<FakeApiState>>,
    stock_requests: Arc<AtomicUsize>,
    product_requests: Arc<AtomicUsize>,
}

impl FakeApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog product. Prices are sent as JSON numbers.
    #[must_use]
    pub fn with_product(self, id: i32, title: &str, price: f64, stock: StockReply) -> Self {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.products.push(json!({
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/tenis{id}.jpg"),
            }));
            state.stock.insert(id, stock);
        }
        self
    }

    /// Delay every stock reply, widening the window for overlapping requests.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .latency = Some(latency);
        self
    }

    /// Change the stock reply for a product.
    pub fn set_stock(&self, id: i32, reply: StockReply) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .stock
            .insert(id, reply);
    }

    /// Number of `/stock/{id}` requests served.
    #[must_use]
    pub fn stock_requests(&self) -> usize {
        self.stock_requests.load(Ordering::SeqCst)
    }

    /// Number of `/products/{id}` requests served.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.product_requests.load(Ordering::SeqCst)
    }

    /// Bind to an ephemeral local port and serve in the background.
    ///
    /// Returns the base URL to configure the client with.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn(&self) -> std::io::Result<Url> {
        let router = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products", get(products))
            .route("/products/{id}", get(product))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Url::parse(&format!("http://{addr}"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    }

    fn latency(&self) -> Option<Duration> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .latency
    }

    fn stock_reply(&self, id: i32) -> Option<StockReply> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .stock
            .get(&id)
            .copied()
    }

    fn find_product(&self, id: i32) -> Option<Value> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .products
            .iter()
            .find(|p| p["id"] == id)
            .cloned()
    }
}

async fn stock(State(api): State<FakeApi>, Path(id): Path<i32>) -> Response {
    api.stock_requests.fetch_add(1, Ordering::SeqCst);
    if let Some(latency) = api.latency() {
        tokio::time::sleep(latency).await;
    }

    match api.stock_reply(id) {
        Some(StockReply::Amount(amount)) => {
            Json(json!({ "id": id, "amount": amount })).into_response()
        }
        Some(StockReply::MissingAmount) => Json(json!({ "id": id })).into_response(),
        Some(StockReply::ServerError) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "stock service unavailable").into_response()
        }
        Some(StockReply::RateLimited(secs)) => {
            let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn product(State(api): State<FakeApi>, Path(id): Path<i32>) -> Response {
    api.product_requests.fetch_add(1, Ordering::SeqCst);
    match api.find_product(id) {
        Some(product) => Json(product).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn products(State(api): State<FakeApi>) -> Json<Vec<Value>> {
    Json(
        api.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .products
            .clone(),
    )
}
