//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Queries are `graphql_client` operations with hand-written wire types
//!   (`storefront::queries`), converted to the domain types in [`types`]
//! - Shopify is the source of truth for carts; nothing is persisted locally
//! - Search results are cached in memory via `moka` (short TTL)
//! - Every catalog query carries `@inContext(language:)` for the visitor's
//!   [`Locale`](crate::locale::Locale)
//!
//! # Example
//!
//! ```rust,ignore
//! use boucle_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.shopify);
//! let hits = client.search_catalog("bouclé OR curly", 20, Locale::Fr).await?;
//! ```

pub mod metafields;
mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use boucle_core::MoneyError;
use thiserror::Error;

/// Errors that can occur when talking to the Storefront API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Cart mutation rejected with user errors (invalid code, unknown line...).
    #[error("User errors: {}", format_user_errors(.0))]
    UserErrors(Vec<CartUserError>),

    /// Response carried a value the domain types cannot represent.
    #[error("Invalid money in response: {0}")]
    Money(#[from] MoneyError),
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_user_errors(errors: &[CartUserError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    let describe = |(i, e): (usize, &GraphQLError)| {
        let mut parts: Vec<String> = Vec::new();
        if !e.message.is_empty() {
            parts.push(e.message.clone());
        }
        if !e.path.is_empty() {
            let segments: Vec<String> = e
                .path
                .iter()
                .map(|p| p.as_str().map_or_else(|| p.to_string(), str::to_string))
                .collect();
            parts.push(format!("path: {}", segments.join(".")));
        }
        if let Some(loc) = e.locations.first() {
            parts.push(format!("at line {}:{}", loc.line, loc.column));
        }
        if parts.is_empty() {
            format!("[error {}]: (no details)", i + 1)
        } else {
            parts.join(" ")
        }
    };

    errors
        .iter()
        .enumerate()
        .map(describe)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("cart gid://shopify/Cart/c1".to_string());
        assert_eq!(err.to_string(), "Not found: cart gid://shopify/Cart/c1");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field 'search' doesn't accept argument 'sort'".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field 'search' doesn't accept argument 'sort'; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_empty_messages() {
        // Test with empty messages but with path info
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 5, column: 10 }],
            path: vec![
                serde_json::Value::String("cartLinesAdd".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: cartLinesAdd.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_no_details() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![],
            path: vec![],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");
    }

    #[test]
    fn test_graphql_error_empty_vec() {
        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_user_errors_display() {
        let err = ShopifyError::UserErrors(vec![
            CartUserError {
                code: Some("DISCOUNT_CODE_NOT_FOUND".to_string()),
                field: vec!["discountCodes".to_string()],
                message: "Code introuvable".to_string(),
            },
            CartUserError {
                code: None,
                field: Vec::new(),
                message: "Quantité invalide".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "User errors: Code introuvable; Quantité invalide"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
