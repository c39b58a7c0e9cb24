//! Status enums for backend entities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// The backend reports status as free text; known values are matched
/// case-insensitively and anything else is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// Whether the order is still moving through fulfillment.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Processing | Self::Shipped)
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(s) => s,
            known => known.to_string(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}
