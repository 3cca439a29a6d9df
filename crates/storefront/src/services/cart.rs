//! Cart state machine.
//!
//! [`CartService`] owns the authoritative cart. All mutation goes through
//! three operations:
//!
//! - [`CartService::add_product`] - one more unit, or a new entry with one unit
//! - [`CartService::remove_product`] - drop an entry
//! - [`CartService::update_product_amount`] - set an absolute amount
//!
//! Each operation validates against live stock, computes the next cart on a
//! copy, writes it to the durable store, and only then publishes it. A failed
//! lookup or write leaves the cart exactly as it was.
//!
//! Operations are serialized by one async mutex held for the whole operation,
//! stock and catalog lookups included. Two overlapping adds therefore apply
//! one after the other instead of both starting from the same snapshot.
//!
//! Failures are returned to the caller and also pushed to the
//! [`NotificationSink`] as a short user-facing message.

use std::fmt;
use std::sync::Arc;

use rocketshoes_core::{Cart, CartInvariantError, ProductId};
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::catalog::{ApiError, ProductCatalog, StockOracle};
use crate::error::{add_breadcrumb, capture_error};
use crate::notify::{NotificationSink, Severity};
use crate::persistence::{CartStorage, PersistenceError};

/// Shown whenever a requested quantity exceeds availability.
pub const OUT_OF_STOCK_MESSAGE: &str = "Requested quantity is out of stock";

/// Shown when the stored cart could not be read back at startup.
pub const RESTORE_FAILED_MESSAGE: &str = "Your saved cart could not be restored";

/// The three cart operations, for messages and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl CartOperation {
    /// Generic user-facing message when this operation fails.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => "Failed to add product",
            Self::Remove => "Failed to remove product",
            Self::UpdateAmount => "Failed to update product amount",
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add_product",
            Self::Remove => "remove_product",
            Self::UpdateAmount => "update_product_amount",
        })
    }
}

/// Broad failure classes. All of them leave the cart unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartErrorKind {
    /// Requested quantity exceeds availability.
    OutOfStock,
    /// The product is not in the cart.
    NotFound,
    /// A lookup or write failed.
    Transient,
}

/// Why a cart operation did not apply.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("requested {requested} of product {product_id}, but only {available} available")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("product {0} is not in the cart")]
    NotFound(ProductId),

    #[error("stock lookup failed: {0}")]
    Stock(#[source] ApiError),

    #[error("catalog lookup failed: {0}")]
    Catalog(#[source] ApiError),

    #[error("cart invariant violated: {0}")]
    Invariant(#[from] CartInvariantError),

    #[error("failed to persist cart: {0}")]
    Persistence(#[from] PersistenceError),
}

impl CartError {
    #[must_use]
    pub const fn kind(&self) -> CartErrorKind {
        match self {
            Self::OutOfStock { .. } => CartErrorKind::OutOfStock,
            Self::NotFound(_) => CartErrorKind::NotFound,
            Self::Stock(_) | Self::Catalog(_) | Self::Invariant(_) | Self::Persistence(_) => {
                CartErrorKind::Transient
            }
        }
    }

    /// Whether this is a fault rather than an expected rejection.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self.kind(), CartErrorKind::Transient)
    }

    /// The message shown to the user when `operation` fails with this error.
    #[must_use]
    pub const fn user_message(&self, operation: CartOperation) -> &'static str {
        match self.kind() {
            CartErrorKind::OutOfStock => OUT_OF_STOCK_MESSAGE,
            CartErrorKind::NotFound | CartErrorKind::Transient => operation.failure_message(),
        }
    }
}

/// Collaborators the cart service is built from.
pub struct CartDependencies {
    pub storage: CartStorage,
    pub stock: Arc<dyn StockOracle>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub notifier: Arc<dyn NotificationSink>,
}

/// Owner of the cart and the only way to change it.
///
/// Cheaply cloneable; clones share the same cart.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    cart: Mutex<Cart>,
    published: watch::Sender<Cart>,
    storage: CartStorage,
    stock: Arc<dyn StockOracle>,
    catalog: Arc<dyn ProductCatalog>,
    notifier: Arc<dyn NotificationSink>,
}

/// `Some(next)` to commit a new cart, `None` when nothing changes.
type Plan = Result<Option<Cart>, CartError>;

impl CartService {
    /// Build the service, restoring the cart from durable storage.
    ///
    /// A missing entry starts an empty cart. Stored text that does not decode
    /// into a valid cart is left untouched, reported, and replaced by an empty
    /// cart in memory; it is overwritten by the next successful mutation.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage backend itself fails.
    pub async fn restore(deps: CartDependencies) -> Result<Self, PersistenceError> {
        let cart = match deps.storage.load().await {
            Ok(cart) => cart,
            Err(err @ PersistenceError::Malformed { .. }) => {
                warn!(error = %err, "Discarding unreadable saved cart");
                deps.notifier.push(RESTORE_FAILED_MESSAGE, Severity::Warning);
                Cart::new()
            }
            Err(err) => return Err(err),
        };

        info!(items = cart.len(), "Cart restored");
        Ok(Self::with_cart(cart, deps))
    }

    fn with_cart(cart: Cart, deps: CartDependencies) -> Self {
        let (published, _) = watch::channel(cart.clone());
        Self {
            inner: Arc::new(CartServiceInner {
                cart: Mutex::new(cart),
                published,
                storage: deps.storage,
                stock: deps.stock,
                catalog: deps.catalog,
                notifier: deps.notifier,
            }),
        }
    }

    /// Snapshot of the last committed cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.published.borrow().clone()
    }

    /// Receive every committed cart from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.published.subscribe()
    }

    /// Add one unit of a product.
    ///
    /// For a product already in the cart this is an amount update to
    /// `current + 1`. Otherwise the product is inserted with amount 1 if at
    /// least one unit is in stock.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when stock is insufficient, or a
    /// transient error if a lookup or the store write fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<(), CartError> {
        let id = product_id.to_string();
        add_breadcrumb("cart", "Add product", Some(&[("product_id", id.as_str())]));

        let mut cart = self.inner.cart.lock().await;
        let plan = self.plan_add(&cart, product_id).await;
        self.settle(CartOperation::Add, &mut cart, plan).await
    }

    /// Remove a product's entry entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the product is not in the cart, or a
    /// transient error if the store write fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) -> Result<(), CartError> {
        let id = product_id.to_string();
        add_breadcrumb("cart", "Remove product", Some(&[("product_id", id.as_str())]));

        let mut cart = self.inner.cart.lock().await;
        let plan = Self::plan_remove(&cart, product_id);
        self.settle(CartOperation::Remove, &mut cart, plan).await
    }

    /// Set a product's amount to exactly `amount`.
    ///
    /// An amount of 0 is ignored; removal goes through
    /// [`CartService::remove_product`]. A product that is not in the cart is
    /// left absent.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when `amount` exceeds availability, or
    /// a transient error if a lookup or the store write fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_product_amount(
        &self,
        product_id: ProductId,
        amount: u32,
    ) -> Result<(), CartError> {
        let id = product_id.to_string();
        let requested = amount.to_string();
        add_breadcrumb(
            "cart",
            "Update product amount",
            Some(&[("product_id", id.as_str()), ("amount", requested.as_str())]),
        );

        let mut cart = self.inner.cart.lock().await;
        let plan = self.plan_update(&cart, product_id, amount).await;
        self.settle(CartOperation::UpdateAmount, &mut cart, plan).await
    }

    // =========================================================================
    // Planning
    // =========================================================================

    async fn plan_add(&self, current: &Cart, product_id: ProductId) -> Plan {
        if let Some(existing) = current.get(product_id) {
            let requested = existing.amount.saturating_add(1);
            return self.plan_update(current, product_id, requested).await;
        }

        self.ensure_available(product_id, 1).await?;

        let product = self
            .inner
            .catalog
            .product(product_id)
            .await
            .map_err(CartError::Catalog)?;

        let mut entry = product.into_cart_product(1);
        entry.id = product_id;

        let mut next = current.clone();
        next.insert(entry)?;
        Ok(Some(next))
    }

    fn plan_remove(current: &Cart, product_id: ProductId) -> Plan {
        let mut next = current.clone();
        match next.remove(product_id) {
            Some(_) => Ok(Some(next)),
            None => Err(CartError::NotFound(product_id)),
        }
    }

    async fn plan_update(&self, current: &Cart, product_id: ProductId, amount: u32) -> Plan {
        if amount == 0 {
            debug!("Ignoring update to zero");
            return Ok(None);
        }

        self.ensure_available(product_id, amount).await?;

        let mut next = current.clone();
        if next.set_amount(product_id, amount)? {
            Ok(Some(next))
        } else {
            debug!("Product not in cart, nothing to update");
            Ok(None)
        }
    }

    /// Fail unless at least `requested` units are in stock right now.
    async fn ensure_available(
        &self,
        product_id: ProductId,
        requested: u32,
    ) -> Result<(), CartError> {
        let available = self
            .inner
            .stock
            .available(product_id)
            .await
            .map_err(CartError::Stock)?;

        if requested > available {
            return Err(CartError::OutOfStock {
                product_id,
                requested,
                available,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Commit
    // =========================================================================

    async fn settle(
        &self,
        operation: CartOperation,
        cart: &mut Cart,
        plan: Plan,
    ) -> Result<(), CartError> {
        let result = match plan {
            Ok(Some(next)) => self.commit(cart, next).await,
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            self.report(operation, err);
        }
        result
    }

    /// Persist first, then swap in memory and publish.
    async fn commit(&self, cart: &mut Cart, next: Cart) -> Result<(), CartError> {
        self.inner.storage.save(&next).await?;

        *cart = next;
        self.inner.published.send_replace(cart.clone());
        debug!(items = cart.len(), total = cart.total_items(), "Cart committed");
        Ok(())
    }

    fn report(&self, operation: CartOperation, err: &CartError) {
        if err.is_fault() {
            capture_error(err, operation.failure_message());
        } else {
            warn!(operation = %operation, error = %err, "Cart operation rejected");
        }
        self.inner
            .notifier
            .push(err.user_message(operation), Severity::Error);
    }
}
