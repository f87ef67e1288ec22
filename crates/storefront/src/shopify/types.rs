//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw wire
//! structures in `storefront::queries`. Money is parsed into
//! [`boucle_core::Money`] and IDs into their typed wrappers at the boundary.

use serde::{Deserialize, Serialize};

pub use boucle_core::{
    CartId, CurrencyCode, Email, LineId, MerchandiseId, Money, NodeId, ProductId, SellingPlanId,
};

// =============================================================================
// Shared Types
// =============================================================================

/// Product or variant image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Taille").
    pub name: String,
    /// Selected value (e.g., "250 ml").
    pub value: String,
}

/// Custom attribute (key-value pair) on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: Option<String>,
}

/// Namespaced metafield attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    /// Metafield namespace (e.g., `custom`).
    pub namespace: String,
    /// Metafield key (e.g., `subtitle_fr`).
    pub key: String,
    /// Raw value.
    pub value: String,
}

/// Pagination information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Cursor for the last item.
    pub end_cursor: Option<String>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Simplified product info for cart merchandise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product ID.
    pub id: Option<ProductId>,
    /// Product handle.
    pub handle: String,
    /// Product title.
    pub title: String,
}

/// Merchandise in a cart line (product variant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: MerchandiseId,
    /// Variant title ("Default Title" for single-variant products).
    pub title: String,
    /// Current unit price, if known.
    pub price: Option<Money>,
    /// Whether available for sale.
    pub available_for_sale: bool,
    /// Selected options.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
    /// Parent product info.
    pub product: CartMerchandiseProduct,
}

impl CartMerchandise {
    /// Minimal merchandise for an optimistic line when the caller did not
    /// submit the selected variant alongside the merchandise ID.
    #[must_use]
    pub fn placeholder(id: MerchandiseId) -> Self {
        Self {
            id,
            title: String::new(),
            price: None,
            available_for_sale: true,
            selected_options: Vec::new(),
            image: None,
            product: CartMerchandiseProduct {
                id: None,
                handle: String::new(),
                title: String::new(),
            },
        }
    }

    /// Variant title for display, hiding Shopify's "Default Title".
    #[must_use]
    pub fn display_title(&self) -> Option<&str> {
        match self.title.as_str() {
            "" | "Default Title" => None,
            title => Some(title),
        }
    }
}

/// Cost for a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineCost {
    /// Price per unit.
    pub amount_per_quantity: Money,
    /// Subtotal (before discounts).
    pub subtotal_amount: Money,
    /// Total (after discounts).
    pub total_amount: Money,
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: LineId,
    /// Quantity. Unsigned, so never negative.
    pub quantity: u32,
    /// Product variant.
    pub merchandise: CartMerchandise,
    /// Line cost; absent for optimistic lines with unknown price.
    pub cost: Option<CartLineCost>,
    /// Custom attributes.
    pub attributes: Vec<Attribute>,
    /// Selling plan (subscription) if any.
    pub selling_plan_id: Option<SellingPlanId>,
    /// True while a pending mutation affecting this line is unconfirmed.
    #[serde(default)]
    pub is_optimistic: bool,
}

/// Cart cost summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    pub subtotal: Money,
    /// Total amount.
    pub total: Money,
    /// Total tax amount.
    pub total_tax: Option<Money>,
}

/// Discount code applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDiscountCode {
    /// The discount code.
    pub code: String,
    /// Whether the code is applicable to the current cart.
    pub applicable: bool,
}

/// Gift card applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedGiftCard {
    /// Shopify gift card ID; `None` while only optimistically applied.
    pub id: Option<String>,
    /// Last characters of the code, the only part Shopify ever returns.
    pub last_characters: String,
    /// Amount used from the card.
    pub amount_used: Option<Money>,
}

impl AppliedGiftCard {
    /// Number of trailing characters Shopify exposes for a gift card code.
    pub const VISIBLE_CHARACTERS: usize = 4;

    /// Optimistic entry for a submitted code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let chars: Vec<char> = code.trim().chars().collect();
        let start = chars.len().saturating_sub(Self::VISIBLE_CHARACTERS);
        Self {
            id: None,
            last_characters: chars.get(start..).unwrap_or_default().iter().collect(),
            amount_used: None,
        }
    }
}

/// Buyer identity for the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartBuyerIdentity {
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Country code (ISO 3166-1 alpha-2).
    pub country_code: Option<String>,
}

/// A shopping cart as confirmed by Shopify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Checkout URL. Required at checkout time; treated as malformed when absent.
    pub checkout_url: Option<String>,
    /// Total item quantity.
    pub total_quantity: u32,
    /// Cart cost summary.
    pub cost: CartCost,
    /// Cart lines, in Shopify's order.
    pub lines: Vec<CartLine>,
    /// Applied discount codes.
    pub discount_codes: Vec<CartDiscountCode>,
    /// Applied gift cards.
    pub applied_gift_cards: Vec<AppliedGiftCard>,
    /// Buyer identity.
    pub buyer_identity: Option<CartBuyerIdentity>,
    /// Cart note.
    pub note: Option<String>,
    /// Last update timestamp (ISO 8601).
    pub updated_at: Option<String>,
}

impl Cart {
    /// Find a line by ID.
    #[must_use]
    pub fn line(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }
}

// =============================================================================
// Cart Inputs
// =============================================================================

/// Input for adding a line to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: MerchandiseId,
    /// Quantity to add.
    pub quantity: u32,
    /// Selling plan ID (for subscriptions).
    pub selling_plan_id: Option<SellingPlanId>,
    /// Custom attributes.
    pub attributes: Vec<Attribute>,
}

impl CartLineInput {
    /// Plain line for a variant.
    #[must_use]
    pub fn new(merchandise_id: impl Into<MerchandiseId>, quantity: u32) -> Self {
        Self {
            merchandise_id: merchandise_id.into(),
            quantity,
            selling_plan_id: None,
            attributes: Vec::new(),
        }
    }
}

/// Input for updating a cart line's quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: LineId,
    /// New quantity; zero removes the line.
    pub quantity: u32,
}

/// Input for updating the buyer identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerIdentityInput {
    /// Email address.
    pub email: Option<Email>,
    /// Phone number (E.164).
    pub phone: Option<String>,
    /// Country code (ISO 3166-1 alpha-2).
    pub country_code: Option<String>,
}

// =============================================================================
// Mutation Results
// =============================================================================

/// User error from cart mutations (e.g., invalid discount code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code.
    pub code: Option<String>,
    /// Field path that caused the error.
    pub field: Vec<String>,
    /// Human-readable error message.
    pub message: String,
}

/// Non-fatal warning from cart mutations (e.g., quantity capped by stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartWarning {
    /// Warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// ID of the affected line or merchandise.
    pub target: Option<String>,
}

/// Payload of any cart mutation: the updated cart plus error and warning lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartMutationPayload {
    /// Updated cart, absent when the mutation was rejected outright.
    pub cart: Option<Cart>,
    /// User errors reported by Shopify.
    pub user_errors: Vec<CartUserError>,
    /// Warnings reported by Shopify.
    pub warnings: Vec<CartWarning>,
}

// =============================================================================
// Search Types
// =============================================================================

/// Product hit from catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProduct {
    /// Product ID.
    pub id: NodeId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Vendor name.
    pub vendor: String,
    /// Lowest variant price.
    pub price: Option<Money>,
    /// Featured image.
    pub image: Option<Image>,
    /// Whether any variant is available.
    pub available_for_sale: bool,
    /// Localized subtitle resolved from metafields.
    pub subtitle: Option<String>,
}

/// Blog article hit from catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchArticle {
    /// Article ID.
    pub id: NodeId,
    /// URL handle.
    pub handle: String,
    /// Blog handle.
    pub blog_handle: String,
    /// Article title.
    pub title: String,
    /// Short excerpt.
    pub excerpt: Option<String>,
}

/// Content page hit from catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Page ID.
    pub id: NodeId,
    /// URL handle.
    pub handle: String,
    /// Page title.
    pub title: String,
}

/// One search result node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchNode {
    Product(SearchProduct),
    Article(SearchArticle),
    Page(SearchPage),
}

impl SearchNode {
    /// Node ID, used to de-duplicate results across fallback queries.
    #[must_use]
    pub const fn id(&self) -> &NodeId {
        match self {
            Self::Product(p) => &p.id,
            Self::Article(a) => &a.id,
            Self::Page(p) => &p.id,
        }
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Product(p) => &p.title,
            Self::Article(a) => &a.title,
            Self::Page(p) => &p.title,
        }
    }

    /// Storefront path for the node.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Product(p) => format!("/products/{}", p.handle),
            Self::Article(a) => format!("/blogs/{}/{}", a.blog_handle, a.handle),
            Self::Page(p) => format!("/pages/{}", p.handle),
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConnection {
    /// Result nodes in relevance order.
    pub nodes: Vec<SearchNode>,
    /// Total number of matches reported by Shopify.
    pub total_count: u64,
    /// Pagination info.
    pub page_info: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gift_card_last_characters() {
        let card = AppliedGiftCard::from_code(" ABCD-EFGH-1234 ");
        assert_eq!(card.last_characters, "1234");
        assert!(card.id.is_none());
        assert_eq!(AppliedGiftCard::from_code("xy").last_characters, "xy");
    }

    #[test]
    fn test_display_title_hides_default() {
        let mut merchandise = CartMerchandise::placeholder(MerchandiseId::new("V1"));
        assert_eq!(merchandise.display_title(), None);
        merchandise.title = "Default Title".to_string();
        assert_eq!(merchandise.display_title(), None);
        merchandise.title = "500 ml".to_string();
        assert_eq!(merchandise.display_title(), Some("500 ml"));
    }

    #[test]
    fn test_search_node_path() {
        let node = SearchNode::Article(SearchArticle {
            id: NodeId::new("gid://shopify/Article/1"),
            handle: "routine-boucles".to_string(),
            blog_handle: "journal".to_string(),
            title: "Routine".to_string(),
            excerpt: None,
        });
        assert_eq!(node.path(), "/blogs/journal/routine-boucles");
        assert_eq!(node.id().as_str(), "gid://shopify/Article/1");
    }
}
