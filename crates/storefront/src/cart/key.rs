//! Coalescing keys for cart mutations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::action::CartActionKind;

/// Separator between the action kind and each affected identifier.
pub const KEY_SEPARATOR: char = '-';

/// Identifies which in-flight mutations supersede each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoalescingKey(String);

impl CoalescingKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoalescingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the key for an action kind and its affected identifiers.
///
/// Identifiers are joined in the order given; callers must supply a
/// consistent order. An empty set yields the bare action kind.
///
/// ```
/// use boucle_storefront::cart::{CartActionKind, coalescing_key};
///
/// let key = coalescing_key(CartActionKind::LinesUpdate, ["gid://shopify/CartLine/A"]);
/// assert_eq!(key.as_str(), "LinesUpdate-gid://shopify/CartLine/A");
/// ```
#[must_use]
pub fn coalescing_key<I, S>(kind: CartActionKind, ids: I) -> CoalescingKey
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::from(kind.as_str());
    for id in ids {
        key.push(KEY_SEPARATOR);
        key.push_str(id.as_ref());
    }
    CoalescingKey(key)
}
