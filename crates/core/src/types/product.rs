//! Catalog records: products and categories.
//!
//! Owned by the catalog backend. The client only reads them; the cart keeps a
//! snapshot of the [`Product`] taken when the item was added.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// A product as returned by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    #[serde(rename = "product_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Units available for purchase.
    #[serde(rename = "stock_quantity")]
    pub stock: u32,
    /// Category the product belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    /// Category display name, if the backend embedded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category identifier.
    #[serde(rename = "category_id")]
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_backend_json() {
        let json = r#"{
            "product_id": 7,
            "name": "Canvas Tote",
            "description": "Soft cotton",
            "price": 24.5,
            "stock_quantity": 3,
            "category_id": 2,
            "category": "Apparel",
            "image_url": "https://cdn.example.com/tee.png"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.price, "24.50".parse().unwrap());
        assert_eq!(product.stock, 3);
        assert_eq!(product.category.as_deref(), Some("Apparel"));
        assert!(product.in_stock());
    }

    #[test]
    fn test_product_optional_fields_default() {
        let json = r#"{"product_id": 1, "name": "Sticker", "price": 2, "stock_quantity": 0}"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.description.is_empty());
        assert!(product.category_id.is_none());
        assert!(!product.in_stock());
    }

    #[test]
    fn test_product_rejects_negative_stock() {
        let json = r#"{"product_id": 1, "name": "Sticker", "price": 2, "stock_quantity": -1}"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }

    #[test]
    fn test_category_from_backend_json() {
        let category: Category =
            serde_json::from_str(r#"{"category_id": 4, "name": "Home"}"#).unwrap();
        assert_eq!(category.id, CategoryId::new(4));
        assert_eq!(category.name, "Home");
    }
}
