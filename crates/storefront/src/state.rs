//! Application state shared by storefront consumers.

use std::sync::Arc;

use tracing::warn;

use crate::catalog::ApiClient;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::notify::{NotificationSink, Severity};
use crate::persistence::{CartStorage, PersistenceError};
use crate::services::cart::{CartDependencies, CartService, RESTORE_FAILED_MESSAGE};
use crate::store::{FileStore, StoreError};

/// Application state: API client and the cart.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    api: ApiClient,
    cart: CartService,
}

impl AppState {
    /// Create the application state, restoring the cart from the configured
    /// file store.
    ///
    /// A store file that is not a valid document at all is moved aside to
    /// `<file>.corrupt` and the cart starts empty.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `notifier` - Where user-facing cart messages are delivered
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built or the store
    /// cannot be read or moved aside.
    pub async fn new(
        config: &StorefrontConfig,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let api = ApiClient::new(&config.api)?;
        let store = Arc::new(FileStore::new(&config.storage.path));
        let storage = CartStorage::new(store.clone(), config.storage.cart_key.clone());

        let deps = || CartDependencies {
            storage: storage.clone(),
            stock: Arc::new(api.clone()),
            catalog: Arc::new(api.clone()),
            notifier: notifier.clone(),
        };

        let cart = match CartService::restore(deps()).await {
            Err(PersistenceError::Store(err @ StoreError::Corrupt { .. })) => {
                warn!(error = %err, "Store document unreadable, starting over");
                store.quarantine().await?;
                notifier.push(RESTORE_FAILED_MESSAGE, Severity::Warning);
                CartService::restore(deps()).await?
            }
            result => result?,
        };

        Ok(Self {
            inner: Arc::new(AppStateInner { api, cart }),
        })
    }

    /// Get a reference to the stock and catalog API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }
}
