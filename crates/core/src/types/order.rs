//! Order records returned by checkout and the order history endpoints.

use serde::{Deserialize, Serialize};

use super::id::{CustomerId, OrderId, OrderItemId, ProductId};
use super::price::Price;
use super::product::Product;
use super::status::OrderStatus;

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    #[serde(rename = "order_id")]
    pub id: OrderId,
    /// Customer who placed the order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    /// Order date, verbatim as formatted by the backend.
    #[serde(default)]
    pub order_date: String,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Order total.
    pub total_amount: Price,
    /// Line items, when the endpoint includes them.
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

impl Order {
    /// Total number of units across all line items.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.order_items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card.
    #[default]
    Credit,
    /// `PayPal` account.
    Paypal,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credit => write!(f, "credit"),
            Self::Paypal => write!(f, "paypal"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "paypal" => Ok(Self::Paypal),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// A single product line within an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Line identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_item_id: Option<OrderItemId>,
    /// Product ordered.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price charged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// Product snapshot, when the endpoint embeds it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_from_backend_json() {
        let json = r#"{
            "order_id": 12,
            "customer_id": 3,
            "order_date": "2026-01-05T10:00:00",
            "status": "Processing",
            "total_amount": 40.0,
            "order_items": [
                {"order_item_id": 1, "product_id": 7, "quantity": 2, "price": 10},
                {"product_id": 8, "quantity": 1}
            ]
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.total_units(), 3);
        assert_eq!(order.total_amount, "40".parse().unwrap());
    }

    #[test]
    fn test_payment_method_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Paypal).unwrap(),
            "\"paypal\""
        );
        assert_eq!("credit".parse::<PaymentMethod>().unwrap(), PaymentMethod::Credit);
        assert!("cash".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_order_without_items() {
        let json = r#"{"order_id": 5, "status": "on hold", "total_amount": 9.99}"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert!(order.order_items.is_empty());
        assert_eq!(order.status, OrderStatus::Other("on hold".to_string()));
    }
}
