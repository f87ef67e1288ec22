//! Cache types for Storefront API responses.

use crate::locale::Locale;
use crate::shopify::types::SearchConnection;

/// Cache key for search responses.
///
/// Results are localized, so the locale is part of the key.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Search {
        query: String,
        first: u16,
        locale: Locale,
    },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Search(SearchConnection),
}
