//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Cart state machine (stock-validated add/remove/update, persisted)

pub mod cart;

pub use cart::{CartDependencies, CartError, CartErrorKind, CartOperation, CartService};
