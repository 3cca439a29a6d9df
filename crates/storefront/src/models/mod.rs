//! Display models for storefront consumers.
//!
//! - [`CartView`] - cart contents with formatted prices
//! - [`ProductListing`] - catalog products with in-cart badge counts

pub mod cart_view;
pub mod listing;

pub use cart_view::{CartItemView, CartView};
pub use listing::{ProductListing, ProductListingItem};
