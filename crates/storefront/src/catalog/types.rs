//! Wire types for the stock and catalog API.

use rocketshoes_core::{CartProduct, Price, ProductId};
use serde::{Deserialize, Serialize};

/// A product as served by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
}

impl CatalogProduct {
    /// Turn this catalog entry into a cart entry holding `amount` units.
    #[must_use]
    pub fn into_cart_product(self, amount: u32) -> CartProduct {
        CartProduct {
            id: self.id,
            title: self.title,
            price: self.price,
            image: self.image,
            amount,
        }
    }
}

/// A stock snapshot for one product.
///
/// Older API revisions omit `amount` (or send `null`) for unavailable items,
/// so a missing quantity reads as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub amount: Option<u32>,
}

impl Stock {
    /// Available units, treating a missing quantity as none.
    #[must_use]
    pub fn available(&self) -> u32 {
        self.amount.unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_missing_amount_is_zero() {
        let stock: Stock = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(stock.available(), 0);

        let stock: Stock = serde_json::from_str(r#"{"id": 3, "amount": null}"#).unwrap();
        assert_eq!(stock.available(), 0);

        let stock: Stock = serde_json::from_str(r#"{"id": 3, "amount": 5}"#).unwrap();
        assert_eq!(stock.available(), 5);
    }

    #[test]
    fn test_stock_rejects_negative_amount() {
        assert!(serde_json::from_str::<Stock>(r#"{"id": 3, "amount": -2}"#).is_err());
    }

    #[test]
    fn test_catalog_product_into_cart_product() {
        let product: CatalogProduct = serde_json::from_str(
            r#"{"id": 2, "title": "Tênis VR Caminhada Confortável Detalhes Couro Masculino",
                "price": 139.9, "image": "https://cdn.example.com/tenis2.jpg"}"#,
        )
        .unwrap();

        let entry = product.into_cart_product(1);
        assert_eq!(entry.id, ProductId::new(2));
        assert_eq!(entry.amount, 1);
        assert_eq!(entry.price, Price::from_cents(13990));
    }
}
