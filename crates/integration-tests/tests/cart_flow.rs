//! End-to-end cart tests.
//!
//! Drives `AppState` (HTTP client, file store and cart service) against the
//! fake API, checking both the in-memory cart and what lands on disk.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rocketshoes_core::{Cart, ProductId};
use rocketshoes_integration_tests::{FakeApi, StockReply};
use rocketshoes_storefront::config::{ApiConfig, StorageConfig, StorefrontConfig};
use rocketshoes_storefront::models::{CartView, ProductListing};
use rocketshoes_storefront::notify::{MemoryNotifier, Severity};
use rocketshoes_storefront::persistence::DEFAULT_CART_KEY;
use rocketshoes_storefront::services::CartErrorKind;
use rocketshoes_storefront::state::AppState;
use rocketshoes_storefront::store::{DurableStore, FileStore};
use tempfile::TempDir;

const OUT_OF_STOCK: &str = "Requested quantity is out of stock";

struct TestContext {
    api: FakeApi,
    config: StorefrontConfig,
    notifier: Arc<MemoryNotifier>,
    _dir: TempDir,
}

impl TestContext {
    async fn new(api: FakeApi) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let base_url = api.spawn().await.unwrap();

        let config = StorefrontConfig {
            api: ApiConfig::new(base_url),
            storage: StorageConfig {
                path: dir.path().join("storage.json"),
                cart_key: DEFAULT_CART_KEY.to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        Self {
            api,
            config,
            notifier: Arc::new(MemoryNotifier::new()),
            _dir: dir,
        }
    }

    /// Build a fresh application, as a new process would.
    async fn start(&self) -> AppState {
        AppState::new(&self.config, self.notifier.clone())
            .await
            .unwrap()
    }

    fn storage_path(&self) -> &Path {
        &self.config.storage.path
    }

    /// The cart as written to disk.
    async fn stored_cart(&self) -> Option<Cart> {
        let store = FileStore::new(PathBuf::from(self.storage_path()));
        store
            .get(DEFAULT_CART_KEY)
            .await
            .unwrap()
            .map(|text| serde_json::from_str(&text).unwrap())
    }
}

fn id(value: i32) -> ProductId {
    ProductId::new(value)
}

fn shoe_store() -> FakeApi {
    FakeApi::new()
        .with_product(
            1,
            "Tênis de Caminhada Leve Confortável",
            179.9,
            StockReply::Amount(5),
        )
        .with_product(
            2,
            "Tênis VR Caminhada Confortável Detalhes Couro Masculino",
            139.9,
            StockReply::Amount(2),
        )
        .with_product(
            3,
            "Tênis Adidas Duramo Lite 2.0",
            219.9,
            StockReply::MissingAmount,
        )
}

// =============================================================================
// Scenario
// =============================================================================

#[tokio::test]
async fn test_add_add_reject_remove_scenario() {
    let ctx = TestContext::new(shoe_store()).await;
    let app = ctx.start().await;
    let cart = app.cart();

    cart.add_product(id(1)).await.unwrap();
    assert_eq!(cart.cart().amount_of(id(1)), 1);
    assert_eq!(ctx.stored_cart().await.unwrap(), cart.cart());

    cart.add_product(id(1)).await.unwrap();
    assert_eq!(cart.cart().amount_of(id(1)), 2);

    let err = cart.update_product_amount(id(1), 10).await.unwrap_err();
    assert_eq!(err.kind(), CartErrorKind::OutOfStock);
    assert_eq!(cart.cart().amount_of(id(1)), 2);
    assert_eq!(ctx.notifier.messages(), vec![OUT_OF_STOCK]);

    cart.remove_product(id(1)).await.unwrap();
    assert!(cart.cart().is_empty());
    assert_eq!(ctx.stored_cart().await.unwrap(), Cart::new());
}

#[tokio::test]
async fn test_entry_carries_catalog_metadata() {
    let ctx = TestContext::new(shoe_store()).await;
    let app = ctx.start().await;

    app.cart().add_product(id(2)).await.unwrap();

    let snapshot = app.cart().cart();
    let entry = snapshot.get(id(2)).unwrap();
    assert_eq!(entry.title, "Tênis VR Caminhada Confortável Detalhes Couro Masculino");
    assert_eq!(entry.price.display(), "R$ 139,90");
    assert!(entry.image.ends_with("tenis2.jpg"));
}

// =============================================================================
// Stock edge cases
// =============================================================================

#[tokio::test]
async fn test_missing_stock_amount_rejects_add() {
    let ctx = TestContext::new(shoe_store()).await;
    let app = ctx.start().await;

    let err = app.cart().add_product(id(3)).await.unwrap_err();

    assert_eq!(err.kind(), CartErrorKind::OutOfStock);
    assert!(app.cart().cart().is_empty());
    assert_eq!(ctx.api.product_requests(), 0);
    assert!(ctx.stored_cart().await.is_none());
}

#[tokio::test]
async fn test_unknown_product_fails_generically() {
    let ctx = TestContext::new(shoe_store()).await;
    let app = ctx.start().await;

    let err = app.cart().add_product(id(77)).await.unwrap_err();

    assert_eq!(err.kind(), CartErrorKind::Transient);
    assert!(app.cart().cart().is_empty());
    assert_eq!(ctx.notifier.messages(), vec!["Failed to add product"]);
}

#[tokio::test]
async fn test_stock_outage_leaves_cart_unchanged() {
    let ctx = TestContext::new(shoe_store()).await;
    let app = ctx.start().await;
    app.cart().add_product(id(1)).await.unwrap();

    ctx.api.set_stock(1, StockReply::ServerError);

    assert!(app.cart().add_product(id(1)).await.is_err());
    assert!(app.cart().update_product_amount(id(1), 3).await.is_err());
    assert_eq!(app.cart().cart().amount_of(id(1)), 1);
    assert_eq!(
        ctx.notifier.messages(),
        vec!["Failed to add product", "Failed to update product amount"]
    );
    assert_eq!(ctx.stored_cart().await.unwrap(), app.cart().cart());
}

#[tokio::test]
async fn test_stock_drop_is_seen_immediately() {
    let ctx = TestContext::new(shoe_store()).await;
    let app = ctx.start().await;
    app.cart().add_product(id(1)).await.unwrap();
    app.cart().update_product_amount(id(1), 4).await.unwrap();

    ctx.api.set_stock(1, StockReply::Amount(4));

    let err = app.cart().add_product(id(1)).await.unwrap_err();
    assert_eq!(err.kind(), CartErrorKind::OutOfStock);
    assert_eq!(app.cart().cart().amount_of(id(1)), 4);
}

// =============================================================================
// Remove and update
// =============================================================================

#[tokio::test]
async fn test_remove_absent_product() {
    let ctx = TestContext::new(shoe_store()).await;
    let app = ctx.start().await;
    app.cart().add_product(id(2)).await.unwrap();

    let err = app.cart().remove_product(id(1)).await.unwrap_err();

    assert_eq!(err.kind(), CartErrorKind::NotFound);
    assert_eq!(app.cart().cart().len(), 1);
    assert_eq!(ctx.notifier.messages(), vec!["Failed to remove product"]);
}

#[tokio::test]
async fn test_update_to_zero_skips_stock_lookup() {
    let ctx = TestContext::new(shoe_store()).await;
    let app = ctx.start().await;
    app.cart().add_product(id(1)).await.unwrap();
    let lookups = ctx.api.stock_requests();

    app.cart().update_product_amount(id(1), 0).await.unwrap();

    assert_eq!(ctx.api.stock_requests(), lookups);
    assert_eq!(app.cart().cart().amount_of(id(1)), 1);
    assert!(ctx.notifier.messages().is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_overlapping_adds_all_apply() {
    let ctx = TestContext::new(shoe_store().with_latency(Duration::from_millis(20))).await;
    let app = ctx.start().await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cart = app.cart().clone();
            tokio::spawn(async move { cart.add_product(id(1)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(app.cart().cart().amount_of(id(1)), 4);
    assert_eq!(ctx.stored_cart().await.unwrap(), app.cart().cart());
}

#[tokio::test]
async fn test_overlapping_adds_stop_at_stock() {
    let ctx = TestContext::new(shoe_store().with_latency(Duration::from_millis(10))).await;
    let app = ctx.start().await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cart = app.cart().clone();
            tokio::spawn(async move { cart.add_product(id(2)).await })
        })
        .collect();
    let mut rejected = 0;
    for handle in handles {
        if handle.await.unwrap().is_err() {
            rejected += 1;
        }
    }

    assert_eq!(app.cart().cart().amount_of(id(2)), 2);
    assert_eq!(rejected, 2);
    assert_eq!(ctx.notifier.messages(), vec![OUT_OF_STOCK, OUT_OF_STOCK]);
}

// =============================================================================
// Persistence across restarts
// =============================================================================

#[tokio::test]
async fn test_cart_survives_restart() {
    let ctx = TestContext::new(shoe_store()).await;

    {
        let app = ctx.start().await;
        app.cart().add_product(id(2)).await.unwrap();
        app.cart().add_product(id(1)).await.unwrap();
        app.cart().update_product_amount(id(1), 3).await.unwrap();
    }

    let app = ctx.start().await;
    let snapshot = app.cart().cart();
    let order: Vec<(i32, u32)> = snapshot
        .items()
        .iter()
        .map(|item| (item.id.as_i32(), item.amount))
        .collect();
    assert_eq!(order, vec![(2, 1), (1, 3)]);

    let view = CartView::from(&snapshot);
    assert_eq!(view.item_count, 4);
    assert_eq!(view.subtotal, "R$ 679,60");
}

#[tokio::test]
async fn test_unreadable_saved_cart_starts_empty() {
    let ctx = TestContext::new(shoe_store()).await;
    let store = FileStore::new(PathBuf::from(ctx.storage_path()));
    store.set(DEFAULT_CART_KEY, "not a cart").await.unwrap();

    let app = ctx.start().await;

    assert!(app.cart().cart().is_empty());
    let notifications = ctx.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].severity, Severity::Warning);
    assert_eq!(
        store.get(DEFAULT_CART_KEY).await.unwrap().as_deref(),
        Some("not a cart")
    );

    app.cart().add_product(id(1)).await.unwrap();
    assert_eq!(ctx.stored_cart().await.unwrap(), app.cart().cart());
}

#[tokio::test]
async fn test_corrupt_store_file_is_moved_aside() {
    let ctx = TestContext::new(shoe_store()).await;
    let torn = "{\"@RocketShoes:cart\": [1, 2";
    tokio::fs::write(ctx.storage_path(), torn).await.unwrap();

    let app = ctx.start().await;

    assert!(app.cart().cart().is_empty());
    let notifications = ctx.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].severity, Severity::Warning);

    let moved = ctx.storage_path().with_file_name("storage.json.corrupt");
    assert_eq!(tokio::fs::read_to_string(&moved).await.unwrap(), torn);

    app.cart().add_product(id(2)).await.unwrap();
    assert_eq!(ctx.stored_cart().await.unwrap(), app.cart().cart());

    // The next run starts cleanly from the rewritten file.
    let restarted = ctx.start().await;
    assert_eq!(restarted.cart().cart().amount_of(id(2)), 1);
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_listing_shows_cart_amounts() {
    let ctx = TestContext::new(shoe_store()).await;
    let app = ctx.start().await;
    app.cart().add_product(id(2)).await.unwrap();
    app.cart().add_product(id(2)).await.unwrap();

    let listing = ProductListing::load(app.api(), &app.cart().cart())
        .await
        .unwrap();

    let rows: Vec<(i32, &str, u32)> = listing
        .items
        .iter()
        .map(|item| (item.id.as_i32(), item.price_formatted.as_str(), item.in_cart))
        .collect();
    assert_eq!(
        rows,
        vec![(1, "R$ 179,90", 0), (2, "R$ 139,90", 2), (3, "R$ 219,90", 0)]
    );
}
