//! Cart mutation requests.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::key::{CoalescingKey, coalescing_key};
use crate::shopify::types::{
    BuyerIdentityInput, CartLineInput, CartLineUpdateInput, CartMerchandise, LineId,
};

/// The cart mutation families of the Storefront API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartActionKind {
    LinesAdd,
    LinesUpdate,
    LinesRemove,
    DiscountCodesUpdate,
    GiftCardCodesUpdate,
    BuyerIdentityUpdate,
}

impl CartActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LinesAdd => "LinesAdd",
            Self::LinesUpdate => "LinesUpdate",
            Self::LinesRemove => "LinesRemove",
            Self::DiscountCodesUpdate => "DiscountCodesUpdate",
            Self::GiftCardCodesUpdate => "GiftCardCodesUpdate",
            Self::BuyerIdentityUpdate => "BuyerIdentityUpdate",
        }
    }

    /// Whether the action changes lines, and therefore quantities and costs.
    #[must_use]
    pub const fn touches_lines(self) -> bool {
        matches!(self, Self::LinesAdd | Self::LinesUpdate | Self::LinesRemove)
    }
}

impl fmt::Display for CartActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line to add, with the variant data needed to draw it before Shopify answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLine {
    pub input: CartLineInput,
    /// Selected variant as shown on the product page, if the caller has it.
    pub merchandise: Option<CartMerchandise>,
}

impl AddLine {
    #[must_use]
    pub const fn new(input: CartLineInput) -> Self {
        Self {
            input,
            merchandise: None,
        }
    }

    #[must_use]
    pub fn with_merchandise(mut self, merchandise: CartMerchandise) -> Self {
        self.merchandise = Some(merchandise);
        self
    }
}

/// Rejected before submission; never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidAction {
    #[error("{0} needs at least one line")]
    NoLines(CartActionKind),
    #[error("cannot add a line with quantity 0")]
    ZeroQuantity,
}

/// One cart mutation with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    LinesAdd(Vec<AddLine>),
    LinesUpdate(Vec<CartLineUpdateInput>),
    LinesRemove(Vec<LineId>),
    DiscountCodesUpdate(Vec<String>),
    GiftCardCodesUpdate(Vec<String>),
    BuyerIdentityUpdate(BuyerIdentityInput),
}

impl CartAction {
    /// Single-line quantity change.
    #[must_use]
    pub fn update_quantity(line_id: impl Into<LineId>, quantity: u32) -> Self {
        Self::LinesUpdate(vec![CartLineUpdateInput {
            id: line_id.into(),
            quantity,
        }])
    }

    /// Single-line removal.
    #[must_use]
    pub fn remove_line(line_id: impl Into<LineId>) -> Self {
        Self::LinesRemove(vec![line_id.into()])
    }

    /// Replace the discount codes. Blank entries are dropped and duplicates
    /// (case-insensitive) keep their first spelling.
    #[must_use]
    pub fn discount_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::DiscountCodesUpdate(normalize_codes(codes))
    }

    /// Replace the gift card codes, normalized like discount codes.
    #[must_use]
    pub fn gift_card_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::GiftCardCodesUpdate(normalize_codes(codes))
    }

    #[must_use]
    pub const fn kind(&self) -> CartActionKind {
        match self {
            Self::LinesAdd(_) => CartActionKind::LinesAdd,
            Self::LinesUpdate(_) => CartActionKind::LinesUpdate,
            Self::LinesRemove(_) => CartActionKind::LinesRemove,
            Self::DiscountCodesUpdate(_) => CartActionKind::DiscountCodesUpdate,
            Self::GiftCardCodesUpdate(_) => CartActionKind::GiftCardCodesUpdate,
            Self::BuyerIdentityUpdate(_) => CartActionKind::BuyerIdentityUpdate,
        }
    }

    /// Identifiers scoping the coalescing key, in payload order.
    ///
    /// Code and buyer identity updates replace cart-wide state, so they share
    /// one global key per kind.
    #[must_use]
    pub fn scope_ids(&self) -> Vec<&str> {
        match self {
            Self::LinesAdd(lines) => lines
                .iter()
                .map(|line| line.input.merchandise_id.as_str())
                .collect(),
            Self::LinesUpdate(updates) => updates.iter().map(|u| u.id.as_str()).collect(),
            Self::LinesRemove(ids) => ids.iter().map(LineId::as_str).collect(),
            Self::DiscountCodesUpdate(_)
            | Self::GiftCardCodesUpdate(_)
            | Self::BuyerIdentityUpdate(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> CoalescingKey {
        coalescing_key(self.kind(), self.scope_ids())
    }

    /// Check the payload before it is submitted.
    ///
    /// # Errors
    ///
    /// Returns an error for empty line lists and zero-quantity additions.
    pub fn validate(&self) -> Result<(), InvalidAction> {
        match self {
            Self::LinesAdd(lines) if lines.is_empty() => {
                Err(InvalidAction::NoLines(CartActionKind::LinesAdd))
            }
            Self::LinesAdd(lines) if lines.iter().any(|l| l.input.quantity == 0) => {
                Err(InvalidAction::ZeroQuantity)
            }
            Self::LinesUpdate(updates) if updates.is_empty() => {
                Err(InvalidAction::NoLines(CartActionKind::LinesUpdate))
            }
            Self::LinesRemove(ids) if ids.is_empty() => {
                Err(InvalidAction::NoLines(CartActionKind::LinesRemove))
            }
            _ => Ok(()),
        }
    }
}

fn normalize_codes<I, S>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .map(|code| code.as_ref().trim().to_string())
        .filter(|code| !code.is_empty() && seen.insert(code.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_key_uses_line_id() {
        let action = CartAction::update_quantity("gid://shopify/CartLine/A", 3);
        assert_eq!(action.key().as_str(), "LinesUpdate-gid://shopify/CartLine/A");
    }

    #[test]
    fn test_update_and_remove_keys_differ() {
        let update = CartAction::update_quantity("L1", 2);
        let remove = CartAction::remove_line("L1");
        assert_ne!(update.key(), remove.key());
        assert_eq!(remove.key().as_str(), "LinesRemove-L1");
    }

    #[test]
    fn test_add_key_uses_merchandise_ids() {
        let action = CartAction::LinesAdd(vec![
            AddLine::new(CartLineInput::new("V1", 1)),
            AddLine::new(CartLineInput::new("V2", 2)),
        ]);
        assert_eq!(action.key().as_str(), "LinesAdd-V1-V2");
    }

    #[test]
    fn test_code_updates_share_global_key() {
        let a = CartAction::discount_codes(["ETE10"]);
        let b = CartAction::discount_codes(Vec::<String>::new());
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().as_str(), "DiscountCodesUpdate");
    }

    #[test]
    fn test_normalize_codes() {
        let action = CartAction::gift_card_codes([" GC-1 ", "", "gc-1", "GC-2"]);
        assert_eq!(
            action,
            CartAction::GiftCardCodesUpdate(vec!["GC-1".to_string(), "GC-2".to_string()])
        );
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            CartAction::LinesAdd(Vec::new()).validate(),
            Err(InvalidAction::NoLines(CartActionKind::LinesAdd))
        );
        assert_eq!(
            CartAction::LinesAdd(vec![AddLine::new(CartLineInput::new("V1", 0))]).validate(),
            Err(InvalidAction::ZeroQuantity)
        );
        assert!(CartAction::LinesRemove(Vec::new()).validate().is_err());
        assert!(CartAction::update_quantity("L1", 0).validate().is_ok());
        assert!(CartAction::discount_codes(Vec::<&str>::new()).validate().is_ok());
    }

    #[test]
    fn test_invalid_action_display() {
        assert_eq!(CartActionKind::LinesRemove.to_string(), "LinesRemove");
        assert_eq!(
            InvalidAction::NoLines(CartActionKind::LinesUpdate).to_string(),
            "LinesUpdate needs at least one line"
        );
    }
}
