//! Checkout: turns the cart into a paid order.
//!
//! Composes the cart and session managers at the moment of the action. Both
//! preconditions (signed in, cart not empty) are re-checked when
//! [`CheckoutService::place_order`] runs, not when the caller last looked.
//!
//! A successful checkout publishes an order-placed notification and then
//! takes the ordered lines out of the cart; anything added while the order
//! was in flight stays. Any failure publishes a single checkout-failed
//! notification and leaves the cart as it was.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use storefront_core::{Order, PaymentMethod, Price};

use crate::api::{
    ApiError, CheckoutLine, CheckoutRequest, PaymentConfirmation, PaymentRequest, StorefrontApi,
};
use crate::cart::{Cart, CartManager};
use crate::guard::InFlight;
use crate::notify::{Notification, Notifier};
use crate::session::SessionManager;

/// Errors returned by [`CheckoutService::place_order`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A checkout is already in progress.
    #[error("a checkout is already in progress")]
    Busy,

    /// No session at the moment of checkout.
    #[error("you must be logged in to check out")]
    NotAuthenticated,

    /// The cart was empty at the moment of checkout.
    #[error("cart is empty")]
    EmptyCart,

    /// Order placement or payment failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// A placed and paid order.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub order: Order,
    pub payment: PaymentConfirmation,
    /// Amount charged, as computed from the cart.
    pub amount: Price,
}

/// Places orders for the current cart on behalf of the current session.
pub struct CheckoutService<A> {
    api: Arc<A>,
    session: Arc<SessionManager<A>>,
    cart: Arc<CartManager>,
    notifier: Notifier,
    in_flight: InFlight,
}

impl<A> std::fmt::Debug for CheckoutService<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("in_flight", &self.in_flight.is_busy())
            .finish_non_exhaustive()
    }
}

impl<A: StorefrontApi> CheckoutService<A> {
    #[must_use]
    pub fn new(
        api: Arc<A>,
        session: Arc<SessionManager<A>>,
        cart: Arc<CartManager>,
        notifier: Notifier,
    ) -> Self {
        Self {
            api,
            session,
            cart,
            notifier,
            in_flight: InFlight::new(),
        }
    }

    /// Whether a checkout is outstanding.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Place an order for the whole cart and pay for it with `method`.
    ///
    /// The cart is read once, when the order is submitted.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Busy` if a checkout is already running,
    /// `CheckoutError::NotAuthenticated` or `CheckoutError::EmptyCart` if a
    /// precondition does not hold, or `CheckoutError::Api` if the backend
    /// refuses the order or the payment.
    #[instrument(skip(self))]
    pub async fn place_order(&self, method: PaymentMethod) -> Result<Receipt, CheckoutError> {
        let _ticket = self.in_flight.try_begin().ok_or(CheckoutError::Busy)?;

        match self.submit(method).await {
            Ok((receipt, ordered)) => {
                info!(
                    order_id = %receipt.order.id,
                    amount = %receipt.amount,
                    "Order placed"
                );
                self.notifier
                    .publish(Notification::order_placed(receipt.order.id));
                self.cart.settle(&ordered);
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = %e, "Checkout failed");
                self.notifier.publish(Notification::checkout_failed());
                Err(e)
            }
        }
    }

    /// Place and pay for the current cart. Returns the receipt and the cart
    /// as it was submitted.
    async fn submit(&self, method: PaymentMethod) -> Result<(Receipt, Cart), CheckoutError> {
        let token = self.session.token().ok_or(CheckoutError::NotAuthenticated)?;

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let amount = cart.totals().total_price;
        let request = CheckoutRequest {
            items: cart
                .items()
                .iter()
                .map(|line| CheckoutLine {
                    product_id: line.product.id,
                    quantity: line.quantity,
                })
                .collect(),
        };

        let order = self.api.checkout(&token, &request).await?;
        let payment = self
            .api
            .process_payment(&token, &PaymentRequest::new(order.id, method, amount))
            .await?;

        Ok((
            Receipt {
                order,
                payment,
                amount,
            },
            cart,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use tokio::sync::broadcast::Receiver;

    use storefront_core::ProductId;

    use super::*;
    use crate::notify::NotificationKind;
    use crate::store::{KeyValueStore, MemoryStore, keys};
    use crate::testing::{FakeApi, product};

    struct Harness {
        api: Arc<FakeApi>,
        store: Arc<MemoryStore>,
        session: Arc<SessionManager<FakeApi>>,
        cart: Arc<CartManager>,
        checkout: Arc<CheckoutService<FakeApi>>,
        rx: Receiver<Notification>,
    }

    async fn harness(signed_in: bool) -> Harness {
        let api = Arc::new(FakeApi::with_account("ada@example.com", "hunter22", "Ada"));
        let store = Arc::new(MemoryStore::new());
        let notifier = Notifier::default();
        let session = Arc::new(SessionManager::new(
            api.clone(),
            store.clone(),
            notifier.clone(),
        ));
        let cart = Arc::new(CartManager::new(store.clone(), notifier.clone()));
        let checkout = Arc::new(CheckoutService::new(
            api.clone(),
            session.clone(),
            cart.clone(),
            notifier.clone(),
        ));
        if signed_in {
            session
                .login("ada@example.com", SecretString::from("hunter22".to_string()))
                .await
                .unwrap();
        }
        let rx = notifier.subscribe();
        Harness {
            api,
            store,
            session,
            cart,
            checkout,
            rx,
        }
    }

    fn kinds(rx: &mut Receiver<Notification>) -> Vec<NotificationKind> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|n| n.kind)
            .collect()
    }

    #[tokio::test]
    async fn test_successful_checkout_clears_cart() {
        let mut h = harness(true).await;
        h.cart.add_item(&product(1, "Tee", "10", 5), 2);
        h.cart.add_item(&product(2, "Mug", "4.50", 5), 1);
        kinds(&mut h.rx);

        let receipt = h.checkout.place_order(PaymentMethod::Paypal).await.unwrap();

        assert_eq!(receipt.amount, "24.50".parse().unwrap());
        assert!(h.cart.is_empty());
        assert_eq!(h.store.get(keys::CART).unwrap().as_deref(), Some("[]"));

        let payments = h.api.payments();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].order_id, receipt.order.id);
        assert_eq!(payments[0].payment_method, PaymentMethod::Paypal);

        let orders = h.api.orders_placed();
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[0].items[0].quantity, 2);

        assert_eq!(
            kinds(&mut h.rx),
            vec![
                NotificationKind::OrderPlaced {
                    order_id: receipt.order.id
                },
                NotificationKind::CartCleared,
            ]
        );
    }

    #[tokio::test]
    async fn test_checkout_requires_session() {
        let mut h = harness(false).await;
        h.cart.add_item(&product(1, "Tee", "10", 5), 1);
        kinds(&mut h.rx);

        let err = h
            .checkout
            .place_order(PaymentMethod::Credit)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::NotAuthenticated));
        assert_eq!(h.cart.quantity_of(ProductId::new(1)), 1);
        assert!(h.api.orders_placed().is_empty());
        assert_eq!(kinds(&mut h.rx), vec![NotificationKind::CheckoutFailed]);
    }

    #[tokio::test]
    async fn test_checkout_requires_items() {
        let mut h = harness(true).await;

        let err = h
            .checkout
            .place_order(PaymentMethod::Credit)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(kinds(&mut h.rx), vec![NotificationKind::CheckoutFailed]);
    }

    #[tokio::test]
    async fn test_payment_failure_keeps_cart() {
        let mut h = harness(true).await;
        h.cart.add_item(&product(1, "Tee", "10", 5), 1);
        kinds(&mut h.rx);
        h.api.fail_payments();

        let err = h
            .checkout
            .place_order(PaymentMethod::Credit)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Api(_)));
        assert_eq!(h.cart.quantity_of(ProductId::new(1)), 1);
        assert!(h.session.is_authenticated());
        assert_eq!(kinds(&mut h.rx), vec![NotificationKind::CheckoutFailed]);
    }

    #[tokio::test]
    async fn test_logout_before_checkout_is_rechecked() {
        let mut h = harness(true).await;
        h.cart.add_item(&product(1, "Tee", "10", 5), 1);
        h.session.logout();
        kinds(&mut h.rx);

        let err = h
            .checkout
            .place_order(PaymentMethod::Credit)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::NotAuthenticated));
        assert_eq!(kinds(&mut h.rx), vec![NotificationKind::CheckoutFailed]);
    }

    #[tokio::test]
    async fn test_concurrent_checkout_is_busy() {
        let mut h = harness(true).await;
        h.cart.add_item(&product(1, "Tee", "10", 5), 1);
        kinds(&mut h.rx);
        let gate = h.api.hold_checkouts();

        let first = tokio::spawn({
            let checkout = h.checkout.clone();
            async move { checkout.place_order(PaymentMethod::Credit).await }
        });
        gate.entered.notified().await;
        assert!(h.checkout.is_processing());

        let second = h.checkout.place_order(PaymentMethod::Credit).await;
        assert!(matches!(second, Err(CheckoutError::Busy)));

        gate.release.notify_one();
        first.await.unwrap().unwrap();

        assert!(!h.checkout.is_processing());
        assert_eq!(h.api.orders_placed().len(), 1);
    }

    #[tokio::test]
    async fn test_items_added_during_checkout_stay_in_cart() {
        let mut h = harness(true).await;
        let tee = product(1, "Tee", "10", 5);
        let mug = product(2, "Mug", "4.50", 5);
        h.cart.add_item(&tee, 2);
        kinds(&mut h.rx);
        let gate = h.api.hold_checkouts();

        let placing = tokio::spawn({
            let checkout = h.checkout.clone();
            async move { checkout.place_order(PaymentMethod::Credit).await }
        });
        gate.entered.notified().await;
        h.cart.add_item(&mug, 1);
        h.cart.add_item(&tee, 1);
        gate.release.notify_one();

        let receipt = placing.await.unwrap().unwrap();

        assert_eq!(receipt.amount, "20".parse().unwrap());
        let ordered = h.api.orders_placed();
        assert_eq!(ordered[0].items.len(), 1);
        assert_eq!(ordered[0].items[0].quantity, 2);

        assert_eq!(h.cart.quantity_of(tee.id), 1);
        assert_eq!(h.cart.quantity_of(mug.id), 1);
        let persisted: Vec<crate::cart::CartLineItem> =
            serde_json::from_str(&h.store.get(keys::CART).unwrap().unwrap()).unwrap();
        assert_eq!(persisted.len(), 2);

        assert_eq!(
            kinds(&mut h.rx),
            vec![
                NotificationKind::ItemAdded { product_id: mug.id },
                NotificationKind::ItemUpdated { product_id: tee.id },
                NotificationKind::OrderPlaced {
                    order_id: receipt.order.id
                },
            ]
        );
    }
}
