//! Type conversion functions for Shopify Storefront API responses.

pub mod cart;
pub mod search;

pub use cart::{convert_cart, convert_payload};
pub use search::convert_search;
