//! Storefront Core - Shared domain types.
//!
//! This crate provides the types shared by every storefront component:
//! - `client` - Cart and session state managers, store and API client
//! - `cli` - Command-line driver over the client library
//! - `integration-tests` - Mock backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no persistence, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, emails, catalog, customer and order records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
