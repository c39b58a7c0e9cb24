//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the typed records exchanged with the storefront backend.

pub mod customer;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use customer::UserProfile;
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem, PaymentMethod};
pub use price::{Price, PriceError};
pub use product::{Category, Product};
pub use status::*;
