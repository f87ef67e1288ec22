//! Boucle Storefront library.
//!
//! Optimistic cart engine and bilingual catalog search on top of the Shopify
//! Storefront API, served as HTMX fragments. The binary in `main.rs` wires
//! these modules into an axum server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod locale;
pub mod middleware;
pub mod routes;
pub mod search;
pub mod shopify;
pub mod state;
