//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` for entry points (the CLI) and helpers that
//! capture errors and breadcrumbs to Sentry. Without an initialized Sentry
//! client the helpers only log.

use thiserror::Error;

use crate::catalog::ApiError;
use crate::config::ConfigError;
use crate::persistence::PersistenceError;
use crate::services::cart::CartError;
use crate::store::StoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Stock or catalog API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A cart operation was rejected or failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Loading or saving the cart failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    /// Whether this error indicates a fault worth reporting to Sentry, as
    /// opposed to an expected rejection (out of stock, not in cart).
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        match self {
            Self::Cart(err) => err.is_fault(),
            Self::Config(_) | Self::Api(_) | Self::Persistence(_) | Self::Store(_) => true,
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Capture an error to Sentry and log it with the event ID.
pub fn capture_error<E>(error: &E, context: &str)
where
    E: std::error::Error + ?Sized,
{
    let event_id = sentry::capture_error(error);
    tracing::error!(
        error = %error,
        sentry_event_id = %event_id,
        "{context}"
    );
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
