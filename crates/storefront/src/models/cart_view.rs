//! Cart display data.

use rocketshoes_core::{Cart, CartProduct};

/// Cart item display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: i32,
    pub title: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl From<&CartProduct> for CartItemView {
    fn from(product: &CartProduct) -> Self {
        Self {
            id: product.id.as_i32(),
            title: product.title.clone(),
            image: product.image.clone(),
            quantity: product.amount,
            price: product.price.display(),
            line_price: product.line_total().display(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            subtotal: cart.subtotal().display(),
            item_count: cart.total_items(),
        }
    }
}
