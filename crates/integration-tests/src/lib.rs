//! Integration tests for the storefront client.
//!
//! The tests drive the real [`HttpApiClient`] and the state managers against
//! [`MockBackend`], an in-process `axum` server that speaks the backend's
//! JSON API. Nothing outside the test process is required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-integration-tests
//! ```
//!
//! # Seed Data
//!
//! | Product | Price | Stock | Category |
//! |---|---|---|---|
//! | 1 House Blend | 12.50 | 10 | 1 Coffee |
//! | 2 Espresso Roast | 14.00 | 2 | 1 Coffee |
//! | 3 Green Tea | 8.25 | 0 | 2 Tea |
//! | 4 Masala Chai | 6.75 | 5 | 2 Tea |
//!
//! Accounts: [`CUSTOMER_EMAIL`] / [`CUSTOMER_PASSWORD`] and
//! [`ADMIN_EMAIL`] / [`ADMIN_PASSWORD`].

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;
use url::Url;

use storefront_client::{
    ApiConfig, HttpApiClient, Notification, NotificationKind, Notifier, SharedStore, Storefront,
};

pub const CUSTOMER_EMAIL: &str = "ada@example.com";
pub const CUSTOMER_PASSWORD: &str = "correct horse";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pass";

/// Date stamped on every order the mock places.
const ORDER_DATE: &str = "2026-10-19 12:00:00";

// =============================================================================
// Backend data
// =============================================================================

#[derive(Debug, Clone)]
struct ProductRow {
    id: i64,
    name: String,
    price: Decimal,
    stock: u32,
    category_id: i64,
}

#[derive(Debug, Clone)]
struct Account {
    customer_id: i64,
    name: String,
    email: String,
    password: String,
    phone: String,
    address: String,
    is_admin: bool,
}

impl Account {
    fn profile_json(&self) -> Value {
        json!({
            "customer_id": self.customer_id,
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "address": self.address,
        })
    }
}

#[derive(Debug, Clone)]
struct OrderRow {
    order_id: i64,
    customer_id: i64,
    total: Decimal,
    lines: Vec<(i64, u32, Decimal)>,
}

impl OrderRow {
    fn to_json(&self) -> Value {
        let items: Vec<Value> = self
            .lines
            .iter()
            .zip(1_i64..)
            .map(|((product_id, quantity, price), n)| {
                json!({
                    "order_item_id": self.order_id * 100 + n,
                    "product_id": product_id,
                    "quantity": quantity,
                    "price": as_number(*price),
                })
            })
            .collect();

        json!({
            "order_id": self.order_id,
            "customer_id": self.customer_id,
            "order_date": ORDER_DATE,
            "status": "Processing",
            "total_amount": as_number(self.total),
            "order_items": items,
        })
    }
}

/// A payment recorded by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRow {
    pub payment_id: i64,
    pub order_id: i64,
    pub method: String,
    pub amount: Decimal,
}

#[derive(Debug, Default)]
struct Db {
    categories: Vec<(i64, String)>,
    products: Vec<ProductRow>,
    accounts: Vec<Account>,
    tokens: HashMap<String, i64>,
    orders: Vec<OrderRow>,
    payments: Vec<PaymentRow>,
    messages: Vec<ContactBody>,
    subscribers: Vec<String>,
    hits: HashMap<&'static str, usize>,
    decline_payments: bool,
    issued: u64,
}

impl Db {
    fn seeded() -> Self {
        let product = |id, name: &str, price: &str, stock, category_id| ProductRow {
            id,
            name: name.to_string(),
            price: price.parse().unwrap_or_default(),
            stock,
            category_id,
        };
        let account = |customer_id, name: &str, email: &str, password: &str, is_admin| Account {
            customer_id,
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            phone: "555-0100".to_string(),
            address: "1 Analytical Way".to_string(),
            is_admin,
        };

        Self {
            categories: vec![(1, "Coffee".to_string()), (2, "Tea".to_string())],
            products: vec![
                product(1, "House Blend", "12.50", 10, 1),
                product(2, "Espresso Roast", "14.00", 2, 1),
                product(3, "Green Tea", "8.25", 0, 2),
                product(4, "Masala Chai", "6.75", 5, 2),
            ],
            accounts: vec![
                account(1, "Ada Lovelace", CUSTOMER_EMAIL, CUSTOMER_PASSWORD, false),
                account(2, "Store Admin", ADMIN_EMAIL, ADMIN_PASSWORD, true),
            ],
            ..Self::default()
        }
    }

    fn hit(&mut self, endpoint: &'static str) {
        *self.hits.entry(endpoint).or_default() += 1;
    }

    fn issue_token(&mut self, customer_id: i64) -> String {
        self.issued += 1;
        let token = format!("mock-token-{customer_id}-{}", self.issued);
        self.tokens.insert(token.clone(), customer_id);
        token
    }

    fn product_json(&self, row: &ProductRow) -> Value {
        let category = self
            .categories
            .iter()
            .find(|(id, _)| *id == row.category_id)
            .map(|(_, name)| name.clone());
        json!({
            "product_id": row.id,
            "name": row.name,
            "description": format!("{} from the mock roastery", row.name),
            "price": as_number(row.price),
            "stock_quantity": row.stock,
            "category_id": row.category_id,
            "category": category,
        })
    }

    fn account_for(&self, headers: &HeaderMap) -> Result<Account, Failure> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| Failure::jwt("Missing Authorization Header"))?;
        let customer_id = self
            .tokens
            .get(token)
            .ok_or_else(|| Failure::jwt("Token has expired"))?;
        self.accounts
            .iter()
            .find(|a| a.customer_id == *customer_id)
            .cloned()
            .ok_or_else(|| Failure::jwt("Token has expired"))
    }
}

/// Kinds of every notification waiting in `rx`, oldest first.
pub fn drain(rx: &mut Receiver<Notification>) -> Vec<NotificationKind> {
    let mut kinds = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        kinds.push(notification.kind);
    }
    kinds
}

fn as_number(amount: Decimal) -> Value {
    json!(amount.to_f64().unwrap_or_default())
}

// =============================================================================
// Errors
// =============================================================================

/// Error reply. Application errors carry `message`, token failures `msg`.
#[derive(Debug)]
struct Failure {
    status: StatusCode,
    field: &'static str,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            field: "message",
            message: message.into(),
        }
    }

    fn jwt(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            field: "msg",
            message: message.to_string(),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut body = serde_json::Map::new();
        body.insert(self.field.to_string(), Value::String(self.message));
        (self.status, Json(Value::Object(body))).into_response()
    }
}

type Reply = Result<(StatusCode, Json<Value>), Failure>;

#[allow(clippy::unnecessary_wraps)]
fn ok(body: Value) -> Reply {
    Ok((StatusCode::OK, Json(body)))
}

// =============================================================================
// MockBackend
// =============================================================================

/// Shared handle on the mock's data.
#[derive(Clone)]
struct MockState {
    db: Arc<Mutex<Db>>,
}

/// An in-process storefront backend listening on an ephemeral port.
///
/// The server task is aborted when the value is dropped.
pub struct MockBackend {
    base_url: Url,
    state: MockState,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a seeded backend on `127.0.0.1` with an OS-assigned port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = MockState {
            db: Arc::new(Mutex::new(Db::seeded())),
        };

        let app = Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .route("/api/auth/profile", get(profile))
            .route("/api/categories", get(categories))
            .route("/api/products", get(products))
            .route("/api/products/{id}", get(product))
            .route("/api/checkout", post(checkout))
            .route("/api/payment", post(payment))
            .route("/api/payment/{order_id}", get(payment_status))
            .route("/api/orders", get(orders))
            .route("/api/orders/{id}", get(order))
            .route("/api/contact", post(contact))
            .route("/api/auth/subscribe", post(subscribe))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}/api"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Ok(Self {
            base_url,
            state,
            server,
        })
    }

    /// Base URL of the API, e.g. `http://127.0.0.1:41234/api`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client settings pointing at this backend.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        let mut config = ApiConfig::new(self.base_url.clone());
        config.timeout = Duration::from_secs(5);
        config
    }

    /// A real HTTP client for this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn client(&self) -> Result<HttpApiClient, storefront_client::ApiError> {
        HttpApiClient::new(&self.api_config())
    }

    /// A fully wired storefront over `store`, talking to this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn storefront(
        &self,
        store: SharedStore,
        notifier: Notifier,
    ) -> Result<Storefront<HttpApiClient>, storefront_client::ApiError> {
        Ok(Storefront::new(store, self.client()?, notifier))
    }

    /// How many requests reached the named handler.
    #[must_use]
    pub fn hits(&self, endpoint: &str) -> usize {
        self.state.db.lock().hits.get(endpoint).copied().unwrap_or(0)
    }

    /// Current stock of a product.
    #[must_use]
    pub fn stock_of(&self, product_id: i64) -> Option<u32> {
        let db = self.state.db.lock();
        db.products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.stock)
    }

    /// Overwrite a product's stock.
    pub fn set_stock(&self, product_id: i64, stock: u32) {
        let mut db = self.state.db.lock();
        if let Some(row) = db.products.iter_mut().find(|p| p.id == product_id) {
            row.stock = stock;
        }
    }

    /// Invalidate every issued token, as if they had all expired.
    pub fn revoke_tokens(&self) {
        self.state.db.lock().tokens.clear();
    }

    /// Make `POST /payment` fail with 402.
    pub fn decline_payments(&self, decline: bool) {
        self.state.db.lock().decline_payments = decline;
    }

    /// Number of orders placed so far.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.state.db.lock().orders.len()
    }

    /// Payments recorded so far, oldest first.
    #[must_use]
    pub fn payments(&self) -> Vec<PaymentRow> {
        self.state.db.lock().payments.clone()
    }

    /// Subjects of the contact messages received, oldest first.
    #[must_use]
    pub fn contact_subjects(&self) -> Vec<String> {
        let db = self.state.db.lock();
        db.messages.iter().map(|m| m.subject.clone()).collect()
    }

    /// Newsletter subscribers, in subscription order.
    #[must_use]
    pub fn subscribers(&self) -> Vec<String> {
        self.state.db.lock().subscribers.clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    address: String,
}

#[derive(Deserialize)]
struct ProductQuery {
    category_id: Option<i64>,
}

#[derive(Deserialize)]
struct CheckoutBody {
    items: Vec<CheckoutLineBody>,
}

#[derive(Deserialize)]
struct CheckoutLineBody {
    product_id: i64,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct ContactBody {
    name: String,
    email: String,
    subject: String,
    message: String,
}

#[derive(Deserialize)]
struct PaymentBody {
    order_id: i64,
    payment_method: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

async fn register(State(state): State<MockState>, Json(body): Json<RegisterBody>) -> Reply {
    let mut db = state.db.lock();
    db.hit("register");

    if db.accounts.iter().any(|a| a.email == body.email) {
        return Err(Failure::new(
            StatusCode::BAD_REQUEST,
            "Email already registered",
        ));
    }

    let customer_id = db.accounts.iter().map(|a| a.customer_id).max().unwrap_or(0) + 1;
    let account = Account {
        customer_id,
        name: body.name,
        email: body.email,
        password: body.password,
        phone: body.phone,
        address: body.address,
        is_admin: false,
    };
    let token = db.issue_token(customer_id);
    let user = account.profile_json();
    db.accounts.push(account);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful",
            "token": token,
            "user": user,
        })),
    ))
}

async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> Reply {
    let mut db = state.db.lock();
    db.hit("login");

    let account = db
        .accounts
        .iter()
        .find(|a| a.email == body.email && a.password == body.password)
        .cloned()
        .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, "Invalid email or password"))?;
    let token = db.issue_token(account.customer_id);

    ok(json!({
        "message": "Login successful",
        "access_token": token,
        "user": account.profile_json(),
        "is_admin": account.is_admin,
    }))
}

async fn profile(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    let mut db = state.db.lock();
    db.hit("profile");

    let account = db.account_for(&headers)?;
    let mut body = account.profile_json();
    body["is_admin"] = json!(account.is_admin);
    ok(body)
}

async fn categories(State(state): State<MockState>) -> Reply {
    let mut db = state.db.lock();
    db.hit("categories");

    let body: Vec<Value> = db
        .categories
        .iter()
        .map(|(id, name)| json!({ "category_id": id, "name": name }))
        .collect();
    ok(Value::Array(body))
}

async fn products(State(state): State<MockState>, Query(query): Query<ProductQuery>) -> Reply {
    let mut db = state.db.lock();
    db.hit("products");

    let body: Vec<Value> = db
        .products
        .iter()
        .filter(|p| query.category_id.is_none_or(|c| c == p.category_id))
        .map(|p| db.product_json(p))
        .collect();
    ok(Value::Array(body))
}

async fn product(State(state): State<MockState>, Path(id): Path<i64>) -> Reply {
    let mut db = state.db.lock();
    db.hit("product");

    let row = db
        .products
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Product not found"))?;
    ok(db.product_json(row))
}

async fn checkout(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Reply {
    let mut db = state.db.lock();
    db.hit("checkout");

    let account = db.account_for(&headers)?;
    if body.items.is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Cart is empty"));
    }

    let mut lines = Vec::with_capacity(body.items.len());
    for item in &body.items {
        let row = db
            .products
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or_else(|| {
                Failure::new(
                    StatusCode::NOT_FOUND,
                    format!("Product {} not found", item.product_id),
                )
            })?;
        if item.quantity == 0 || item.quantity > row.stock {
            return Err(Failure::new(
                StatusCode::BAD_REQUEST,
                format!("Insufficient stock for {}", row.name),
            ));
        }
        lines.push((row.id, item.quantity, row.price));
    }

    for (product_id, quantity, _) in &lines {
        if let Some(row) = db.products.iter_mut().find(|p| p.id == *product_id) {
            row.stock -= quantity;
        }
    }

    let order = OrderRow {
        order_id: 1000 + i64::try_from(db.orders.len()).unwrap_or(0) + 1,
        customer_id: account.customer_id,
        total: lines
            .iter()
            .map(|(_, quantity, price)| *price * Decimal::from(*quantity))
            .sum(),
        lines,
    };
    let body = order.to_json();
    db.orders.push(order);

    Ok((StatusCode::CREATED, Json(body)))
}

async fn payment(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<PaymentBody>,
) -> Reply {
    let mut db = state.db.lock();
    db.hit("payment");

    let account = db.account_for(&headers)?;
    if !db
        .orders
        .iter()
        .any(|o| o.order_id == body.order_id && o.customer_id == account.customer_id)
    {
        return Err(Failure::new(StatusCode::NOT_FOUND, "Order not found"));
    }
    if db.decline_payments {
        return Err(Failure::new(StatusCode::PAYMENT_REQUIRED, "Payment declined"));
    }

    let payment_id = i64::try_from(db.payments.len()).unwrap_or(0) + 1;
    db.payments.push(PaymentRow {
        payment_id,
        order_id: body.order_id,
        method: body.payment_method,
        amount: body.amount,
    });

    ok(json!({
        "message": "Payment processed successfully",
        "payment_id": payment_id,
        "status": "Completed",
    }))
}

async fn payment_status(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(order_id): Path<i64>,
) -> Reply {
    let mut db = state.db.lock();
    db.hit("payment_status");

    let account = db.account_for(&headers)?;
    let owned = db
        .orders
        .iter()
        .any(|o| o.order_id == order_id && o.customer_id == account.customer_id);
    let payment = db
        .payments
        .iter()
        .find(|p| p.order_id == order_id)
        .filter(|_| owned)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Payment not found"))?;

    ok(json!({
        "payment_id": payment.payment_id,
        "order_id": payment.order_id,
        "payment_method": payment.method,
        "amount": as_number(payment.amount),
        "status": "Completed",
    }))
}

async fn orders(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    let mut db = state.db.lock();
    db.hit("orders");

    let account = db.account_for(&headers)?;
    let body: Vec<Value> = db
        .orders
        .iter()
        .filter(|o| o.customer_id == account.customer_id)
        .map(OrderRow::to_json)
        .collect();
    ok(Value::Array(body))
}

async fn order(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut db = state.db.lock();
    db.hit("order");

    let account = db.account_for(&headers)?;
    let order = db
        .orders
        .iter()
        .find(|o| o.order_id == id && o.customer_id == account.customer_id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Order not found"))?;
    ok(order.to_json())
}

async fn contact(State(state): State<MockState>, Json(body): Json<ContactBody>) -> Reply {
    let mut db = state.db.lock();
    db.hit("contact");

    let blank = [&body.name, &body.email, &body.subject, &body.message]
        .iter()
        .any(|field| field.trim().is_empty());
    if blank {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "All fields are required"));
    }
    db.messages.push(body);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Message received" })),
    ))
}

/// The body is the address as a bare JSON string. A bearer token, when
/// present, must still be valid.
async fn subscribe(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(email): Json<String>,
) -> Reply {
    let mut db = state.db.lock();
    db.hit("subscribe");

    if headers.contains_key(header::AUTHORIZATION) {
        db.account_for(&headers)?;
    }
    if db.subscribers.contains(&email) {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Email already subscribed"));
    }
    db.subscribers.push(email);

    ok(json!({ "message": "Subscribed to newsletter" }))
}
