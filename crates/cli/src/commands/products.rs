//! Product listing command.
//!
//! # Usage
//!
//! ```bash
//! rocketshoes products
//! ```

use rocketshoes_storefront::catalog::ApiError;
use rocketshoes_storefront::models::ProductListing;
use rocketshoes_storefront::state::AppState;

/// Print every catalog product with its price and in-cart quantity.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn list(state: &AppState) -> Result<(), ApiError> {
    let listing = ProductListing::load(state.api(), &state.cart().cart()).await?;

    if listing.items.is_empty() {
        println!("No products available.");
        return Ok(());
    }

    for item in &listing.items {
        println!(
            "#{:<4} {:<48} {:>12}  [in cart: {}]",
            item.id, item.title, item.price_formatted, item.in_cart
        );
    }
    Ok(())
}
