//! Fire-and-forget notifications for UI feedback.
//!
//! Every user-visible outcome of a manager operation (item added, stock limit
//! hit, login failed, ...) is published as a [`Notification`]. Notifications
//! are not persisted and nothing in the client depends on them being read:
//! publishing with no subscribers is fine, and a subscriber that falls more
//! than the channel capacity behind skips the oldest messages.
//!
//! # Example
//!
//! ```rust,ignore
//! let notifier = Notifier::new(64);
//! let mut toasts = notifier.subscribe();
//!
//! cart.add_item(&product, 1);
//!
//! while let Ok(toast) = toasts.try_recv() {
//!     show_toast(toast.severity, &toast.title, &toast.message);
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use storefront_core::{OrderId, Product, ProductId};

/// Default number of notifications buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Confirmation of a successful action.
    Info,
    /// A rejected or failed action.
    Error,
}

/// Machine-readable description of what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    ItemAdded { product_id: ProductId },
    ItemUpdated { product_id: ProductId },
    ItemRemoved { product_id: ProductId },
    CartCleared,
    StockLimit { product_id: ProductId, available: u32 },
    InvalidQuantity { product_id: ProductId },
    LoginSucceeded,
    LoginFailed,
    RegistrationSucceeded,
    RegistrationFailed,
    LoggedOut,
    SessionExpired,
    OrderPlaced { order_id: OrderId },
    CheckoutFailed,
}

impl NotificationKind {
    /// Severity implied by the kind.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::StockLimit { .. }
            | Self::InvalidQuantity { .. }
            | Self::LoginFailed
            | Self::RegistrationFailed
            | Self::SessionExpired
            | Self::CheckoutFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

/// A single UI notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Unique id, so a UI can dismiss or de-duplicate toasts.
    pub id: Uuid,
    /// What happened.
    #[serde(flatten)]
    pub kind: NotificationKind,
    /// Presentation severity.
    pub severity: Severity,
    /// Short headline.
    pub title: String,
    /// Human-readable description.
    pub message: String,
    /// When the notification was issued.
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification; severity follows from `kind`.
    #[must_use]
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            severity: kind.severity(),
            kind,
            title: title.into(),
            message: message.into(),
            issued_at: Utc::now(),
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[must_use]
    pub fn item_added(product: &Product) -> Self {
        Self::new(
            NotificationKind::ItemAdded {
                product_id: product.id,
            },
            "Added to cart",
            format!("{} added to your cart.", product.name),
        )
    }

    #[must_use]
    pub fn item_updated(product: &Product) -> Self {
        Self::new(
            NotificationKind::ItemUpdated {
                product_id: product.id,
            },
            "Cart updated",
            format!("{} quantity updated in cart.", product.name),
        )
    }

    #[must_use]
    pub fn item_removed(product: &Product) -> Self {
        Self::new(
            NotificationKind::ItemRemoved {
                product_id: product.id,
            },
            "Removed from cart",
            format!("{} removed from your cart.", product.name),
        )
    }

    #[must_use]
    pub fn cart_cleared() -> Self {
        Self::new(
            NotificationKind::CartCleared,
            "Cart cleared",
            "All items have been removed from your cart.",
        )
    }

    /// Stock limit hit while adding to the cart.
    #[must_use]
    pub fn stock_limit_on_add(product: &Product) -> Self {
        Self::stock_limit("Cannot add more", product)
    }

    /// Stock limit hit while changing a line item's quantity.
    #[must_use]
    pub fn stock_limit_on_update(product: &Product) -> Self {
        Self::stock_limit("Cannot update", product)
    }

    fn stock_limit(title: &str, product: &Product) -> Self {
        Self::new(
            NotificationKind::StockLimit {
                product_id: product.id,
                available: product.stock,
            },
            title,
            format!(
                "Sorry, only {} {} available in stock.",
                product.stock, product.name
            ),
        )
    }

    #[must_use]
    pub fn invalid_quantity(product: &Product) -> Self {
        Self::new(
            NotificationKind::InvalidQuantity {
                product_id: product.id,
            },
            "Invalid quantity",
            format!("Quantity for {} must be at least 1.", product.name),
        )
    }

    // =========================================================================
    // Session
    // =========================================================================

    #[must_use]
    pub fn login_succeeded(name: &str) -> Self {
        Self::new(
            NotificationKind::LoginSucceeded,
            "Login successful",
            format!("Welcome back, {name}!"),
        )
    }

    #[must_use]
    pub fn login_failed() -> Self {
        Self::new(
            NotificationKind::LoginFailed,
            "Login failed",
            "Invalid email or password",
        )
    }

    #[must_use]
    pub fn registration_succeeded(name: &str) -> Self {
        Self::new(
            NotificationKind::RegistrationSucceeded,
            "Registration successful",
            format!("Welcome, {name}!"),
        )
    }

    #[must_use]
    pub fn registration_failed() -> Self {
        Self::new(
            NotificationKind::RegistrationFailed,
            "Registration failed",
            "Could not create account",
        )
    }

    #[must_use]
    pub fn logged_out() -> Self {
        Self::new(
            NotificationKind::LoggedOut,
            "Logged out",
            "You have been logged out successfully",
        )
    }

    #[must_use]
    pub fn session_expired() -> Self {
        Self::new(
            NotificationKind::SessionExpired,
            "Session expired",
            "Please log in again",
        )
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    #[must_use]
    pub fn order_placed(order_id: OrderId) -> Self {
        Self::new(
            NotificationKind::OrderPlaced { order_id },
            "Order placed successfully!",
            format!("Your order #{order_id} has been confirmed."),
        )
    }

    #[must_use]
    pub fn checkout_failed() -> Self {
        Self::new(
            NotificationKind::CheckoutFailed,
            "Checkout failed",
            "There was an error processing your order. Please try again.",
        )
    }
}

/// Publishes notifications to any number of observers.
///
/// Cheap to clone; all clones feed the same channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    /// Create a notifier buffering up to `capacity` notifications per
    /// subscriber. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new observer. It receives notifications published from
    /// now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publish a notification. Never fails; with no observers the
    /// notification is dropped.
    pub fn publish(&self, notification: Notification) {
        tracing::debug!(
            kind = ?notification.kind,
            severity = ?notification.severity,
            message = %notification.message,
            "Notification"
        );
        let _ = self.sender.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
