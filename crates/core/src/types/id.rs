//! Newtype IDs for Shopify global identifiers.
//!
//! Shopify hands out opaque string IDs such as
//! `gid://shopify/CartLine/4f2a?cart=c1-9b`. Use the `define_gid!` macro to
//! create type-safe wrappers that prevent passing a line ID where a
//! merchandise ID is expected.

/// Prefix shared by every Shopify global ID.
pub const SHOPIFY_GID_PREFIX: &str = "gid://shopify/";

/// Macro to define a type-safe global ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`, `resource_type()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
///
/// IDs are not validated: test fixtures and optimistic placeholders use
/// short IDs such as `"V1"`.
///
/// # Example
///
/// ```rust
/// # use boucle_core::define_gid;
/// define_gid!(LineId);
/// define_gid!(VariantId);
///
/// let line = LineId::new("gid://shopify/CartLine/1");
/// assert_eq!(line.resource_type(), Some("CartLine"));
///
/// // These are different types, so this won't compile:
/// // let _: VariantId = line;
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw ID string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw ID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the raw ID string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Resource segment of a Shopify global ID (`CartLine`, `ProductVariant`).
            ///
            /// Returns `None` for IDs that are not `gid://shopify/` URIs.
            #[must_use]
            pub fn resource_type(&self) -> Option<&str> {
                self.0
                    .strip_prefix($crate::types::id::SHOPIFY_GID_PREFIX)
                    .and_then(|rest| rest.split('/').next())
                    .filter(|segment| !segment.is_empty())
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_gid!(CartId);
define_gid!(LineId);
define_gid!(MerchandiseId);
define_gid!(ProductId);
define_gid!(SellingPlanId);
define_gid!(NodeId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_from_gid() {
        let id = LineId::new("gid://shopify/CartLine/abc?cart=xyz");
        assert_eq!(id.resource_type(), Some("CartLine"));
    }

    #[test]
    fn test_resource_type_for_plain_id() {
        assert_eq!(MerchandiseId::new("V1").resource_type(), None);
        assert_eq!(MerchandiseId::new("gid://shopify/").resource_type(), None);
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = CartId::new("gid://shopify/Cart/c1");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"gid://shopify/Cart/c1\"");
    }

    #[test]
    fn test_display_matches_raw() {
        let id = ProductId::from("gid://shopify/Product/7");
        assert_eq!(id.to_string(), "gid://shopify/Product/7");
        assert_eq!(String::from(id), "gid://shopify/Product/7");
    }
}
