//! Remote API client for the storefront backend.
//!
//! # Architecture
//!
//! - [`StorefrontApi`] is the seam the managers depend on; tests inject fakes
//! - [`HttpApiClient`] is the production implementation over `reqwest`
//! - The client is stateless with respect to the session: authenticated
//!   calls take the bearer token as an argument
//! - Catalog reads are cached in-process via `moka` (5 minute TTL by default)
//!
//! # Endpoints
//!
//! | Operation | Route | Auth |
//! |---|---|---|
//! | register | `POST /auth/register` | no |
//! | login | `POST /auth/login` | no |
//! | fetch profile | `GET /auth/profile` | bearer |
//! | categories | `GET /categories` | no |
//! | products | `GET /products[?category_id=]` | no |
//! | product | `GET /products/{id}` | no |
//! | checkout | `POST /checkout` | bearer |
//! | payment | `POST /payment`, `GET /payment/{order_id}` | bearer |
//! | orders | `GET /orders`, `GET /orders/{id}` | bearer |
//! | contact | `POST /contact` | no |
//! | newsletter | `POST /auth/subscribe` | optional bearer |

mod cache;
mod http;
pub mod types;

pub use http::{ApiConfig, HttpApiClient};
pub use types::*;

use secrecy::SecretString;
use thiserror::Error;

use storefront_core::{Category, CategoryId, Email, Order, OrderId, Product, ProductId};

/// Errors that can occur when calling the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the credentials or the bearer token (401/403).
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Response body is not the expected JSON shape.
    #[error("Response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response body parsed but a required field is absent.
    #[error("Response missing required field '{0}'")]
    MissingField(&'static str),

    /// Endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status carried by the error, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Whether the backend refused the token or credentials (401-class).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Operations offered by the storefront backend.
///
/// Implementations own no business state. Authenticated operations receive
/// the bearer token explicitly.
pub trait StorefrontApi: Send + Sync {
    /// Create an account. Returns a token and the new customer's profile.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// Exchange credentials for a token, profile and admin flag.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// Fetch the profile and admin flag of the token's owner.
    fn fetch_profile(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Profile, ApiError>> + Send;

    /// Place an order for the given lines.
    fn checkout(
        &self,
        token: &SecretString,
        request: &CheckoutRequest,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;

    /// Pay for a placed order.
    fn process_payment(
        &self,
        token: &SecretString,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<PaymentConfirmation, ApiError>> + Send;

    /// Look up the payment recorded for an order.
    fn get_payment(
        &self,
        token: &SecretString,
        order_id: OrderId,
    ) -> impl Future<Output = Result<PaymentConfirmation, ApiError>> + Send;

    /// All product categories.
    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>, ApiError>> + Send;

    /// Products, optionally restricted to one category.
    fn list_products(
        &self,
        category: Option<CategoryId>,
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// A single product.
    fn get_product(&self, id: ProductId)
    -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// The token owner's order history.
    fn list_orders(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    /// A single order of the token's owner.
    fn get_order(
        &self,
        token: &SecretString,
        id: OrderId,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;

    /// Send a contact form message.
    fn contact(
        &self,
        message: &ContactMessage,
    ) -> impl Future<Output = Result<Acknowledgement, ApiError>> + Send;

    /// Subscribe `email` to the newsletter. The token is attached when the
    /// caller has one.
    fn subscribe_newsletter(
        &self,
        token: Option<&SecretString>,
        email: &Email,
    ) -> impl Future<Output = Result<Acknowledgement, ApiError>> + Send;
}
