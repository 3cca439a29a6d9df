//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! rocketshoes cart
//! rocketshoes add 1
//! rocketshoes update 1 3
//! rocketshoes remove 1
//! ```

use rocketshoes_core::ProductId;
use rocketshoes_storefront::models::CartView;
use rocketshoes_storefront::notify::{Notification, Severity};
use rocketshoes_storefront::services::CartError;
use rocketshoes_storefront::state::AppState;

/// Print the current cart.
pub fn show(state: &AppState) {
    print_cart(&CartView::from(&state.cart().cart()));
}

/// Add one unit of `id` and print the resulting cart.
///
/// # Errors
///
/// Returns the cart error if the product could not be added.
pub async fn add(state: &AppState, id: ProductId) -> Result<(), CartError> {
    state.cart().add_product(id).await?;
    show(state);
    Ok(())
}

/// Remove `id` and print the resulting cart.
///
/// # Errors
///
/// Returns the cart error if the product could not be removed.
pub async fn remove(state: &AppState, id: ProductId) -> Result<(), CartError> {
    state.cart().remove_product(id).await?;
    show(state);
    Ok(())
}

/// Set the amount of `id` and print the resulting cart.
///
/// # Errors
///
/// Returns the cart error if the amount could not be updated.
pub async fn update(state: &AppState, id: ProductId, amount: u32) -> Result<(), CartError> {
    state.cart().update_product_amount(id, amount).await?;
    show(state);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(view: &CartView) {
    if view.items.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for item in &view.items {
        println!(
            "#{:<4} {:<48} {:>3} x {:>12} = {:>12}",
            item.id, item.title, item.quantity, item.price, item.line_price
        );
    }
    println!("{} item(s), subtotal {}", view.item_count, view.subtotal);
}

/// Print notifications raised while the command ran.
#[allow(clippy::print_stderr)]
pub fn print_notifications(notifications: &[Notification]) {
    for notification in notifications {
        let label = match notification.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        eprintln!("{label}: {}", notification.message);
    }
}
