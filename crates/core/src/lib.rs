//! Boucle Core - Shared commerce types.
//!
//! This crate provides the value types used by the storefront and its tests:
//! - `storefront` - Public-facing site and cart engine
//! - `integration-tests` - Cross-module scenarios
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Shopify hands
//! out opaque global IDs (`gid://shopify/CartLine/...`) and decimal strings for
//! money; both are wrapped here so the rest of the workspace never mixes them up.
//!
//! # Modules
//!
//! - [`types`] - Global ID newtypes, money arithmetic, and email addresses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
