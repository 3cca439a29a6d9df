//! Cart aggregate.
//!
//! A [`Cart`] is an ordered list of [`CartProduct`] entries keyed by product ID.
//! The type owns its invariants:
//!
//! - product IDs are unique within the cart
//! - every entry has `amount >= 1` (an entry with zero units is absent, not
//!   zero-valued)
//! - insertion order is preserved for stable rendering
//!
//! Deserialization goes through the same checks, so a persisted cart that
//! violates them is rejected instead of becoming a corrupt in-memory cart.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;

/// Violations of the cart invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartInvariantError {
    /// The product is already present in the cart.
    #[error("product {0} is already in the cart")]
    Duplicate(ProductId),

    /// An entry would hold zero units.
    #[error("product {0} cannot have an amount of zero")]
    ZeroAmount(ProductId),
}

/// A product selected into the cart, with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    pub amount: u32,
}

impl CartProduct {
    /// Line total (`price * amount`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.amount
    }
}

/// The user's in-progress selection of products and quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartProduct>", into = "Vec<CartProduct>")]
pub struct Cart {
    items: Vec<CartProduct>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// All entries, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartProduct] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an entry by product ID.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartProduct> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Units of `id` in the cart, 0 when absent.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> u32 {
        self.get(id).map_or(0, |item| item.amount)
    }

    /// Append a new entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is already present or the amount is 0.
    pub fn insert(&mut self, product: CartProduct) -> Result<(), CartInvariantError> {
        if product.amount == 0 {
            return Err(CartInvariantError::ZeroAmount(product.id));
        }
        if self.contains(product.id) {
            return Err(CartInvariantError::Duplicate(product.id));
        }
        self.items.push(product);
        Ok(())
    }

    /// Replace the amount of an existing entry.
    ///
    /// Returns `Ok(false)` when the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is 0; removal goes through [`Cart::remove`].
    pub fn set_amount(&mut self, id: ProductId, amount: u32) -> Result<bool, CartInvariantError> {
        if amount == 0 {
            return Err(CartInvariantError::ZeroAmount(id));
        }
        Ok(self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .map(|item| item.amount = amount)
            .is_some())
    }

    /// Remove the entry for `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: ProductId) -> Option<CartProduct> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Per-product amounts, for badge counts on product listings.
    #[must_use]
    pub fn amounts(&self) -> BTreeMap<ProductId, u32> {
        self.items.iter().map(|item| (item.id, item.amount)).collect()
    }

    /// Total number of units across all entries.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartProduct::line_total).sum()
    }
}

impl TryFrom<Vec<CartProduct>> for Cart {
    type Error = CartInvariantError;

    fn try_from(items: Vec<CartProduct>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.amount == 0 {
                return Err(CartInvariantError::ZeroAmount(item.id));
            }
            if !seen.insert(item.id) {
                return Err(CartInvariantError::Duplicate(item.id));
            }
        }
        Ok(Self { items })
    }
}

impl From<Cart> for Vec<CartProduct> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartProduct;
    type IntoIter = std::slice::Iter<'a, CartProduct>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
