//! Typed request and response records for the storefront backend.
//!
//! Every endpoint has an explicit schema. Responses are parsed at the client
//! boundary; a body missing a required field fails with a typed error instead
//! of leaking half-populated records into the managers.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use storefront_core::{Email, OrderId, PaymentMethod, Price, ProductId, UserProfile};

use super::ApiError;

// =============================================================================
// Authentication
// =============================================================================

/// Login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

/// New-account registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    pub phone: String,
    pub address: String,
}

/// Successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    /// Bearer token for authenticated calls.
    pub token: SecretString,
    /// Authenticated customer's profile.
    pub user: UserProfile,
    /// Whether the customer has admin rights. Registration responses
    /// usually omit it.
    pub is_admin: bool,
    /// Backend's human-readable message, if any.
    pub message: Option<String>,
}

/// Raw login/registration body. The backend has used both `access_token`
/// and `token` for the bearer token.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponseBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
    #[serde(default)]
    is_admin: bool,
}

impl TryFrom<AuthResponseBody> for AuthResponse {
    type Error = ApiError;

    fn try_from(body: AuthResponseBody) -> Result<Self, Self::Error> {
        let token = body
            .access_token
            .or(body.token)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::MissingField("access_token"))?;
        let user = body.user.ok_or(ApiError::MissingField("user"))?;

        Ok(Self {
            token: SecretString::from(token),
            user,
            is_admin: body.is_admin,
            message: body.message,
        })
    }
}

/// Profile of the token's owner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserProfile,
    #[serde(default)]
    pub is_admin: bool,
}

// =============================================================================
// Checkout & Payment
// =============================================================================

/// One `(product, quantity)` pair handed to checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Checkout request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
}

/// Payment request body. The amount goes over the wire as a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl PaymentRequest {
    /// Build a payment request for `amount`.
    #[must_use]
    pub fn new(order_id: OrderId, payment_method: PaymentMethod, amount: Price) -> Self {
        Self {
            order_id,
            payment_method,
            amount: amount.amount(),
        }
    }
}

/// Payment confirmation. The gateway is opaque; only the commonly returned
/// fields are typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub payment_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Contact & Newsletter
// =============================================================================

/// Contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
}

/// Bare acknowledgement returned by fire-and-forget endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}
