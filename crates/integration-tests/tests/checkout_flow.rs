//! Integration tests for checkout gating and order placement.
//!
//! Covers the happy path end to end (order, payment, cart cleared, stock
//! decremented) and each way a checkout can be refused.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::broadcast::Receiver;

use storefront_client::store::keys;
use storefront_client::{
    AppError, CheckoutError, HttpApiClient, KeyValueStore, MemoryStore, Notification,
    NotificationKind, Notifier, Storefront, StorefrontApi,
};
use storefront_core::{PaymentMethod, Price, ProductId};
use storefront_integration_tests::{CUSTOMER_EMAIL, CUSTOMER_PASSWORD, MockBackend, drain};

struct Shop {
    backend: MockBackend,
    store: Arc<MemoryStore>,
    storefront: Storefront<HttpApiClient>,
    rx: Receiver<Notification>,
}

async fn shop(signed_in: bool) -> Shop {
    let backend = MockBackend::start().await.unwrap();
    let store = Arc::new(MemoryStore::new());
    let notifier = Notifier::default();
    let rx = notifier.subscribe();
    let storefront = backend.storefront(store.clone(), notifier).unwrap();

    if signed_in {
        storefront
            .session()
            .login(
                CUSTOMER_EMAIL,
                SecretString::from(CUSTOMER_PASSWORD.to_string()),
            )
            .await
            .unwrap();
    }

    Shop {
        backend,
        store,
        storefront,
        rx,
    }
}

impl Shop {
    async fn add(&self, product_id: i64, quantity: u32) {
        let product = self
            .storefront
            .api()
            .get_product(ProductId::new(product_id))
            .await
            .unwrap();
        self.storefront.cart().add_item(&product, quantity);
    }
}

#[tokio::test]
async fn test_checkout_places_and_pays_then_clears_cart() {
    let mut shop = shop(true).await;
    shop.add(4, 2).await;
    shop.add(1, 1).await;
    drain(&mut shop.rx);

    let receipt = shop
        .storefront
        .checkout()
        .place_order(PaymentMethod::Paypal)
        .await
        .unwrap();

    let expected: Price = "26.00".parse().unwrap();
    assert_eq!(receipt.amount, expected);
    assert_eq!(receipt.order.total_amount, expected);
    assert_eq!(receipt.order.total_units(), 3);
    assert_eq!(receipt.payment.status.as_deref(), Some("Completed"));

    let payments = shop.backend.payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].order_id, receipt.order.id.as_i64());
    assert_eq!(payments[0].method, "paypal");
    assert_eq!(payments[0].amount.round_dp(2), expected.amount());

    assert!(shop.storefront.cart().is_empty());
    assert_eq!(shop.store.get(keys::CART).unwrap().as_deref(), Some("[]"));
    assert_eq!(shop.backend.stock_of(4), Some(3));
    assert_eq!(shop.backend.stock_of(1), Some(9));
    assert!(!shop.storefront.checkout().is_processing());

    assert_eq!(
        drain(&mut shop.rx),
        vec![
            NotificationKind::OrderPlaced {
                order_id: receipt.order.id
            },
            NotificationKind::CartCleared,
        ]
    );
}

#[tokio::test]
async fn test_placed_order_shows_in_history() {
    let shop = shop(true).await;
    shop.add(2, 2).await;

    let receipt = shop
        .storefront
        .checkout()
        .place_order(PaymentMethod::Credit)
        .await
        .unwrap();

    let token = shop.storefront.session().token().unwrap();
    let api = shop.storefront.api();

    let orders = api.list_orders(&token).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, receipt.order.id);
    assert!(orders[0].status.is_open());

    let payment = api.get_payment(&token, receipt.order.id).await.unwrap();
    assert_eq!(payment.payment_id, receipt.payment.payment_id);
}

#[tokio::test]
async fn test_anonymous_checkout_is_refused() {
    let mut shop = shop(false).await;
    shop.add(1, 1).await;
    drain(&mut shop.rx);

    let err = shop
        .storefront
        .checkout()
        .place_order(PaymentMethod::Credit)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::NotAuthenticated));
    assert_eq!(shop.storefront.cart().quantity_of(ProductId::new(1)), 1);
    assert_eq!(shop.backend.hits("checkout"), 0);
    assert_eq!(drain(&mut shop.rx), vec![NotificationKind::CheckoutFailed]);
}

#[tokio::test]
async fn test_empty_cart_checkout_is_refused() {
    let shop = shop(true).await;

    let err = shop
        .storefront
        .checkout()
        .place_order(PaymentMethod::Credit)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(shop.backend.hits("checkout"), 0);
}

#[tokio::test]
async fn test_backend_stock_shortfall_keeps_cart() {
    let mut shop = shop(true).await;
    shop.add(2, 2).await;
    shop.backend.set_stock(2, 1);
    drain(&mut shop.rx);

    let err = shop
        .storefront
        .checkout()
        .place_order(PaymentMethod::Credit)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Insufficient stock"));
    assert_eq!(shop.storefront.cart().quantity_of(ProductId::new(2)), 2);
    assert_eq!(shop.backend.order_count(), 0);
    assert_eq!(drain(&mut shop.rx), vec![NotificationKind::CheckoutFailed]);
}

#[tokio::test]
async fn test_declined_payment_keeps_cart() {
    let shop = shop(true).await;
    shop.add(1, 2).await;
    shop.backend.decline_payments(true);

    let err = shop
        .storefront
        .checkout()
        .place_order(PaymentMethod::Credit)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Api(ref e) if e.status() == Some(402)));
    assert_eq!(shop.backend.order_count(), 1);
    assert!(shop.backend.payments().is_empty());
    assert_eq!(shop.storefront.cart().quantity_of(ProductId::new(1)), 2);
}

#[tokio::test]
async fn test_revoked_token_surfaces_as_unauthorized() {
    let shop = shop(true).await;
    shop.add(1, 1).await;
    shop.backend.revoke_tokens();

    let err: AppError = shop
        .storefront
        .checkout()
        .place_order(PaymentMethod::Credit)
        .await
        .unwrap_err()
        .into();
    assert!(err.is_unauthorized());

    shop.storefront.session().expire();
    assert!(!shop.storefront.session().is_authenticated());
    assert!(!shop.store.contains(keys::TOKEN));
    assert_eq!(shop.storefront.cart().quantity_of(ProductId::new(1)), 1);
}
