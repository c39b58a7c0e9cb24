//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Notify;

use storefront_core::{
    Category, CategoryId, CustomerId, Email, Order, OrderId, OrderStatus, Price, Product,
    ProductId, UserProfile,
};

use crate::api::{
    Acknowledgement, ApiError, AuthResponse, CheckoutRequest, ContactMessage, Credentials,
    PaymentConfirmation, PaymentRequest, Profile, Registration, StorefrontApi,
};
use crate::store::{KeyValueStore, StoreError};

/// A product with the given id, name, unit price and stock.
#[allow(clippy::unwrap_used)]
pub fn product(id: i64, name: &str, price: &str, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: String::new(),
        price: price.parse().unwrap(),
        stock,
        category_id: None,
        category: None,
        image_url: None,
    }
}

/// A store whose every operation fails.
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("disk on fire".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk on fire".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk on fire".to_string()))
    }
}

/// Pauses a fake call until the test releases it.
#[derive(Default)]
pub struct Gate {
    /// Notified when the call has started.
    pub entered: Notify,
    /// Notify to let the call finish.
    pub release: Notify,
}

impl Gate {
    async fn pass(gate: Option<Arc<Self>>) {
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }
}

struct Account {
    password: String,
    profile: UserProfile,
    is_admin: bool,
}

/// In-memory backend. Tokens are `token-<email>`.
#[derive(Default)]
pub struct FakeApi {
    accounts: Mutex<HashMap<String, Account>>,
    calls: AtomicUsize,
    profile_fetches: AtomicUsize,
    orders: Mutex<Vec<CheckoutRequest>>,
    payments: Mutex<Vec<PaymentRequest>>,
    fail_payments: AtomicBool,
    login_gate: Mutex<Option<Arc<Gate>>>,
    profile_gate: Mutex<Option<Arc<Gate>>>,
    checkout_gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeApi {
    #[allow(clippy::unwrap_used)]
    pub fn with_account(email: &str, password: &str, name: &str) -> Self {
        let api = Self::default();
        api.accounts.lock().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                profile: UserProfile {
                    customer_id: Some(CustomerId::new(1)),
                    name: name.to_string(),
                    email: Email::parse(email).unwrap(),
                    phone: None,
                    address: None,
                },
                is_admin: false,
            },
        );
        api
    }

    pub fn token_for(email: &str) -> String {
        format!("token-{email}")
    }

    /// Number of remote calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn profile_fetches(&self) -> usize {
        self.profile_fetches.load(Ordering::SeqCst)
    }

    pub fn orders_placed(&self) -> Vec<CheckoutRequest> {
        self.orders.lock().clone()
    }

    pub fn payments(&self) -> Vec<PaymentRequest> {
        self.payments.lock().clone()
    }

    pub fn fail_payments(&self) {
        self.fail_payments.store(true, Ordering::SeqCst);
    }

    /// Hold every subsequent login until the returned gate is released.
    pub fn hold_logins(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.login_gate.lock() = Some(gate.clone());
        gate
    }

    /// Hold every subsequent profile fetch until the returned gate is released.
    pub fn hold_profiles(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.profile_gate.lock() = Some(gate.clone());
        gate
    }

    /// Hold every subsequent checkout until the returned gate is released.
    pub fn hold_checkouts(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.checkout_gate.lock() = Some(gate.clone());
        gate
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn authorize(&self, token: &SecretString) -> Result<(UserProfile, bool), ApiError> {
        let accounts = self.accounts.lock();
        token
            .expose_secret()
            .strip_prefix("token-")
            .and_then(|email| accounts.get(email))
            .map(|a| (a.profile.clone(), a.is_admin))
            .ok_or_else(|| ApiError::Unauthorized {
                status: 401,
                message: "Token has expired".to_string(),
            })
    }

    fn auth_response(email: &str, profile: UserProfile, is_admin: bool) -> AuthResponse {
        AuthResponse {
            token: SecretString::from(Self::token_for(email)),
            user: profile,
            is_admin,
            message: None,
        }
    }
}

impl StorefrontApi for FakeApi {
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        self.record_call();
        let email = registration.email.as_str().to_string();
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(&email) {
            return Err(ApiError::Status {
                status: 409,
                message: "Email already registered".to_string(),
            });
        }

        let profile = UserProfile {
            customer_id: Some(CustomerId::new(i64::try_from(accounts.len()).unwrap_or(0) + 1)),
            name: registration.name.clone(),
            email: registration.email.clone(),
            phone: Some(registration.phone.clone()),
            address: Some(registration.address.clone()),
        };
        accounts.insert(
            email.clone(),
            Account {
                password: registration.password.expose_secret().to_string(),
                profile: profile.clone(),
                is_admin: false,
            },
        );
        Ok(Self::auth_response(&email, profile, false))
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.record_call();
        let gate = self.login_gate.lock().clone();
        Gate::pass(gate).await;

        let email = credentials.email.as_str();
        let accounts = self.accounts.lock();
        match accounts.get(email) {
            Some(a) if a.password == credentials.password.expose_secret() => {
                Ok(Self::auth_response(email, a.profile.clone(), a.is_admin))
            }
            _ => Err(ApiError::Unauthorized {
                status: 401,
                message: "Invalid email or password".to_string(),
            }),
        }
    }

    async fn fetch_profile(&self, token: &SecretString) -> Result<Profile, ApiError> {
        self.record_call();
        self.profile_fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.profile_gate.lock().clone();
        Gate::pass(gate).await;

        let (user, is_admin) = self.authorize(token)?;
        Ok(Profile { user, is_admin })
    }

    async fn checkout(
        &self,
        token: &SecretString,
        request: &CheckoutRequest,
    ) -> Result<Order, ApiError> {
        self.record_call();
        let (user, _) = self.authorize(token)?;
        let gate = self.checkout_gate.lock().clone();
        Gate::pass(gate).await;

        let mut orders = self.orders.lock();
        orders.push(request.clone());
        Ok(Order {
            id: OrderId::new(i64::try_from(orders.len()).unwrap_or(0)),
            customer_id: user.customer_id,
            order_date: "2026-10-19".to_string(),
            status: OrderStatus::Processing,
            total_amount: Price::ZERO,
            order_items: Vec::new(),
        })
    }

    async fn process_payment(
        &self,
        token: &SecretString,
        request: &PaymentRequest,
    ) -> Result<PaymentConfirmation, ApiError> {
        self.record_call();
        self.authorize(token)?;
        if self.fail_payments.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 502,
                message: "Payment gateway unavailable".to_string(),
            });
        }

        let mut payments = self.payments.lock();
        payments.push(request.clone());
        Ok(PaymentConfirmation {
            payment_id: i64::try_from(payments.len()).ok(),
            status: Some("completed".to_string()),
            message: None,
        })
    }

    async fn get_payment(
        &self,
        token: &SecretString,
        order_id: OrderId,
    ) -> Result<PaymentConfirmation, ApiError> {
        self.record_call();
        self.authorize(token)?;
        Err(ApiError::NotFound(format!("payment for order {order_id}")))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.record_call();
        Ok(Vec::new())
    }

    async fn list_products(&self, _category: Option<CategoryId>) -> Result<Vec<Product>, ApiError> {
        self.record_call();
        Ok(Vec::new())
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.record_call();
        Err(ApiError::NotFound(format!("product {id}")))
    }

    async fn list_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        self.record_call();
        self.authorize(token)?;
        Ok(Vec::new())
    }

    async fn get_order(&self, token: &SecretString, id: OrderId) -> Result<Order, ApiError> {
        self.record_call();
        self.authorize(token)?;
        Err(ApiError::NotFound(format!("order {id}")))
    }

    async fn contact(&self, _message: &ContactMessage) -> Result<Acknowledgement, ApiError> {
        self.record_call();
        Ok(Acknowledgement::default())
    }

    async fn subscribe_newsletter(
        &self,
        _token: Option<&SecretString>,
        _email: &Email,
    ) -> Result<Acknowledgement, ApiError> {
        self.record_call();
        Ok(Acknowledgement::default())
    }
}
