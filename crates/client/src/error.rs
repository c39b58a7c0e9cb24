//! Unified error handling.
//!
//! Provides a single `AppError` for callers that drive several components
//! (the CLI, an embedding UI) and want one error type to propagate with `?`.

use thiserror::Error;

use storefront_core::EmailError;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::store::StoreError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The persistent store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Login, registration or bootstrap failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// A form email was rejected locally.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The operation needs a signed-in session.
    #[error("Not logged in")]
    NotAuthenticated,
}

impl AppError {
    /// Whether the backend rejected the session's token.
    ///
    /// Callers use this to apply
    /// [`SessionManager::expire`](crate::session::SessionManager::expire).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        match self {
            Self::Api(e)
            | Self::Session(SessionError::Api(e))
            | Self::Checkout(CheckoutError::Api(e)) => e.is_unauthorized(),
            _ => false,
        }
    }
}
