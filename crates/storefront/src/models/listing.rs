//! Product listing with per-product cart counts.

use rocketshoes_core::{Cart, Price, ProductId};

use crate::catalog::{ApiError, CatalogProduct, ProductCatalog};

/// One product on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListingItem {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub price: Price,
    pub price_formatted: String,
    /// Units of this product already in the cart (0 when absent).
    pub in_cart: u32,
}

/// Catalog products in catalog order, annotated with cart counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListing {
    pub items: Vec<ProductListingItem>,
}

impl ProductListing {
    /// Annotate `products` with the amounts currently in `cart`.
    #[must_use]
    pub fn build(products: Vec<CatalogProduct>, cart: &Cart) -> Self {
        let amounts = cart.amounts();

        let items = products
            .into_iter()
            .map(|product| ProductListingItem {
                in_cart: amounts.get(&product.id).copied().unwrap_or(0),
                price_formatted: product.price.display(),
                id: product.id,
                title: product.title,
                image: product.image,
                price: product.price,
            })
            .collect();

        Self { items }
    }

    /// Fetch the catalog and annotate it with `cart`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn load(catalog: &dyn ProductCatalog, cart: &Cart) -> Result<Self, ApiError> {
        let products = catalog.products().await?;
        Ok(Self::build(products, cart))
    }
}
