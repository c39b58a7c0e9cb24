//! Storefront Client - Cart and session state for the storefront.
//!
//! This crate keeps a shopping cart and an authenticated session alive
//! across restarts, synchronized with a durable key-value store and the
//! storefront backend's JSON API.
//!
//! # Architecture
//!
//! - [`store`] - Durable string key-value store (memory and file backed)
//! - [`api`] - Typed client for the backend, with catalog caching
//! - [`notify`] - Fire-and-forget notifications for UI feedback
//! - [`cart`] - Cart manager: stock-checked line items, persisted
//! - [`session`] - Session manager: login, registration, bootstrap, logout
//! - [`checkout`] - Places and pays for an order for the current cart
//! - [`state`] - [`Storefront`] context wiring everything together
//!
//! The managers share no mutable state. Each owns one store key and
//! publishes through the same [`Notifier`].
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let storefront = Storefront::from_config(&config)?;
//! storefront.session().bootstrap().await?;
//!
//! let product = storefront.api().get_product(ProductId::new(7)).await?;
//! storefront.cart().add_item(&product, 1);
//! storefront.checkout().place_order(PaymentMethod::Credit).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod guard;
pub mod notify;
pub mod session;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiConfig, ApiError, HttpApiClient, StorefrontApi};
pub use cart::{Cart, CartChange, CartLineItem, CartManager, CartTotals};
pub use checkout::{CheckoutError, CheckoutService, Receipt};
pub use config::{ClientConfig, ConfigError};
pub use error::AppError;
pub use notify::{Notification, NotificationKind, Notifier, Severity};
pub use session::{Session, SessionError, SessionManager};
pub use state::Storefront;
pub use store::{FileStore, KeyValueStore, MemoryStore, SharedStore, StoreError};
