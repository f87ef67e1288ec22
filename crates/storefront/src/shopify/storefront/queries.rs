//! GraphQL operations for the Shopify Storefront API.
//!
//! Each operation implements [`GraphQLQuery`] over hand-written wire types.
//! Cart mutations alias their root field to `payload` so they share one
//! response shape.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

/// Fields selected on every cart.
macro_rules! cart_fragment {
    () => {
        r"
fragment MoneyFields on MoneyV2 { amount currencyCode }
fragment ImageFields on Image { url altText width height }
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  note
  updatedAt
  cost {
    subtotalAmount { ...MoneyFields }
    totalAmount { ...MoneyFields }
    totalTaxAmount { ...MoneyFields }
  }
  lines(first: 100) {
    nodes {
      id
      quantity
      attributes { key value }
      cost {
        amountPerQuantity { ...MoneyFields }
        subtotalAmount { ...MoneyFields }
        totalAmount { ...MoneyFields }
      }
      sellingPlanAllocation { sellingPlan { id } }
      merchandise {
        ... on ProductVariant {
          id
          title
          availableForSale
          price { ...MoneyFields }
          selectedOptions { name value }
          image { ...ImageFields }
          product { id handle title }
        }
      }
    }
  }
  discountCodes { code applicable }
  appliedGiftCards { id lastCharacters amountUsed { ...MoneyFields } }
  buyerIdentity { email phone countryCode }
}
"
    };
}

/// Selection for every cart mutation payload.
macro_rules! cart_payload {
    () => {
        r"{
    cart { ...CartFields }
    userErrors { code field message }
    warnings { code message target }
  }"
    };
}

// =============================================================================
// Shared Wire Types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeNode {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoNode {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetafieldNode {
    pub namespace: String,
    pub key: String,
    pub value: String,
}

// =============================================================================
// Cart Wire Types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNode {
    pub id: String,
    pub checkout_url: Option<String>,
    pub total_quantity: i64,
    pub note: Option<String>,
    pub updated_at: Option<String>,
    pub cost: CartCostNode,
    pub lines: Nodes<CartLineNode>,
    #[serde(default)]
    pub discount_codes: Vec<DiscountCodeNode>,
    #[serde(default)]
    pub applied_gift_cards: Vec<GiftCardNode>,
    pub buyer_identity: Option<BuyerIdentityNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostNode {
    pub subtotal_amount: MoneyV2,
    pub total_amount: MoneyV2,
    pub total_tax_amount: Option<MoneyV2>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineNode {
    pub id: String,
    pub quantity: i64,
    #[serde(default)]
    pub attributes: Vec<AttributeNode>,
    pub cost: CartLineCostNode,
    pub selling_plan_allocation: Option<SellingPlanAllocationNode>,
    /// Empty object for merchandise types other than `ProductVariant`.
    pub merchandise: MerchandiseNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostNode {
    pub amount_per_quantity: MoneyV2,
    pub subtotal_amount: MoneyV2,
    pub total_amount: MoneyV2,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellingPlanAllocationNode {
    pub selling_plan: SellingPlanNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SellingPlanNode {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseNode {
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub available_for_sale: bool,
    pub price: Option<MoneyV2>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOptionNode>,
    pub image: Option<ImageNode>,
    pub product: Option<MerchandiseProductNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionNode {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseProductNode {
    pub id: String,
    pub handle: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountCodeNode {
    pub code: String,
    pub applicable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCardNode {
    pub id: String,
    pub last_characters: String,
    pub amount_used: Option<MoneyV2>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerIdentityNode {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorNode {
    pub code: Option<String>,
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarningNode {
    pub code: String,
    pub message: String,
    pub target: Option<String>,
}

/// Shared payload of every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayloadNode {
    pub cart: Option<CartNode>,
    #[serde(default)]
    pub user_errors: Vec<UserErrorNode>,
    #[serde(default)]
    pub warnings: Vec<WarningNode>,
}

/// Response of any cart mutation (root field aliased to `payload`).
#[derive(Debug, Clone, Deserialize)]
pub struct CartMutationData {
    pub payload: Option<CartPayloadNode>,
}

// =============================================================================
// Cart Inputs
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInputNode {
    pub merchandise_id: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineUpdateInputNode {
    pub id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerIdentityInputNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartInputNode {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<CartLineInputNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift_card_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_identity: Option<BuyerIdentityInputNode>,
}

// =============================================================================
// Cart Operations
// =============================================================================

pub struct GetCart;

pub mod get_cart {
    use super::{CartNode, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartNode>,
    }
}

impl GraphQLQuery for GetCart {
    type Variables = get_cart::Variables;
    type ResponseData = get_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: concat!(
                "query GetCart($cartId: ID!) { cart(id: $cartId) { ...CartFields } }\n",
                cart_fragment!()
            ),
            operation_name: "GetCart",
        }
    }
}

/// Declare a cart mutation whose variables are `$cartId` plus one argument.
macro_rules! cart_mutation {
    ($name:ident, $module:ident, $op:literal, $field:literal, $arg:literal, $arg_type:literal, $rust_field:ident: $rust_type:ty) => {
        pub struct $name;

        pub mod $module {
            #[allow(clippy::wildcard_imports)]
            use super::*;

            #[derive(Debug, Clone, Serialize)]
            #[serde(rename_all = "camelCase")]
            pub struct Variables {
                pub cart_id: String,
                pub $rust_field: $rust_type,
            }
        }

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = CartMutationData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: concat!(
                        "mutation ", $op, "($cartId: ID!, $", $arg, ": ", $arg_type, ") {\n",
                        "  payload: ", $field, "(cartId: $cartId, ", $arg, ": $", $arg, ") ",
                        cart_payload!(),
                        "\n}\n",
                        cart_fragment!()
                    ),
                    operation_name: $op,
                }
            }
        }
    };
}

cart_mutation!(
    CartLinesAdd, cart_lines_add, "CartLinesAdd", "cartLinesAdd",
    "lines", "[CartLineInput!]!", lines: Vec<CartLineInputNode>
);
cart_mutation!(
    CartLinesUpdate, cart_lines_update, "CartLinesUpdate", "cartLinesUpdate",
    "lines", "[CartLineUpdateInput!]!", lines: Vec<CartLineUpdateInputNode>
);
cart_mutation!(
    CartLinesRemove, cart_lines_remove, "CartLinesRemove", "cartLinesRemove",
    "lineIds", "[ID!]!", line_ids: Vec<String>
);
cart_mutation!(
    CartDiscountCodesUpdate, cart_discount_codes_update, "CartDiscountCodesUpdate",
    "cartDiscountCodesUpdate", "discountCodes", "[String!]!", discount_codes: Vec<String>
);
cart_mutation!(
    CartGiftCardCodesUpdate, cart_gift_card_codes_update, "CartGiftCardCodesUpdate",
    "cartGiftCardCodesUpdate", "giftCardCodes", "[String!]!", gift_card_codes: Vec<String>
);
cart_mutation!(
    CartBuyerIdentityUpdate, cart_buyer_identity_update, "CartBuyerIdentityUpdate",
    "cartBuyerIdentityUpdate", "buyerIdentity", "CartBuyerIdentityInput!",
    buyer_identity: BuyerIdentityInputNode
);

pub struct CartCreate;

pub mod cart_create {
    use super::{CartInputNode, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInputNode,
    }
}

impl GraphQLQuery for CartCreate {
    type Variables = cart_create::Variables;
    type ResponseData = CartMutationData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: concat!(
                "mutation CartCreate($input: CartInput!) {\n",
                "  payload: cartCreate(input: $input) ",
                cart_payload!(),
                "\n}\n",
                cart_fragment!()
            ),
            operation_name: "CartCreate",
        }
    }
}

// =============================================================================
// Search
// =============================================================================

pub struct Search;

pub mod search {
    use super::{Deserialize, ImageNode, MetafieldNode, MoneyV2, PageInfoNode, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct MetafieldIdentifier {
        pub namespace: String,
        pub key: String,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub query: String,
        pub first: i64,
        /// `LanguageCode` enum value (`FR`, `EN`).
        pub language: String,
        pub metafields: Vec<MetafieldIdentifier>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub search: SearchResults,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SearchResults {
        pub total_count: i64,
        pub page_info: PageInfoNode,
        pub nodes: Vec<SearchResultItem>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(tag = "__typename")]
    pub enum SearchResultItem {
        Product(ProductHit),
        Article(ArticleHit),
        Page(PageHit),
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductHit {
        pub id: String,
        pub handle: String,
        pub title: String,
        #[serde(default)]
        pub vendor: String,
        pub available_for_sale: bool,
        pub price_range: PriceRange,
        pub featured_image: Option<ImageNode>,
        #[serde(default)]
        pub metafields: Vec<Option<MetafieldNode>>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRange {
        pub min_variant_price: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ArticleHit {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub excerpt: Option<String>,
        pub blog: BlogRef,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct BlogRef {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct PageHit {
        pub id: String,
        pub handle: String,
        pub title: String,
    }
}

impl GraphQLQuery for Search {
    type Variables = search::Variables;
    type ResponseData = search::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: r"
query Search($query: String!, $first: Int!, $language: LanguageCode, $metafields: [HasMetafieldsIdentifier!]!)
@inContext(language: $language) {
  search(query: $query, first: $first, types: [PRODUCT, ARTICLE, PAGE], prefix: LAST) {
    totalCount
    pageInfo { hasNextPage endCursor }
    nodes {
      __typename
      ... on Product {
        id
        handle
        title
        vendor
        availableForSale
        priceRange { minVariantPrice { amount currencyCode } }
        featuredImage { url altText width height }
        metafields(identifiers: $metafields) { namespace key value }
      }
      ... on Article { id handle title excerpt blog { handle } }
      ... on Page { id handle title }
    }
  }
}
",
            operation_name: "Search",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_aliases_payload() {
        let body = CartLinesUpdate::build_query(cart_lines_update::Variables {
            cart_id: "gid://shopify/Cart/c1".to_string(),
            lines: vec![CartLineUpdateInputNode {
                id: "L1".to_string(),
                quantity: 3,
            }],
        });
        assert_eq!(body.operation_name, "CartLinesUpdate");
        assert!(body.query.contains("payload: cartLinesUpdate(cartId: $cartId, lines: $lines)"));
        assert!(body.query.contains("fragment CartFields on Cart"));

        let json = serde_json::to_value(&body.variables).unwrap();
        assert_eq!(json["cartId"], "gid://shopify/Cart/c1");
        assert_eq!(json["lines"][0]["quantity"], 3);
    }

    #[test]
    fn test_cart_input_skips_empty_fields() {
        let input = CartInputNode {
            discount_codes: Some(vec!["ETE10".to_string()]),
            ..CartInputNode::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({ "discountCodes": ["ETE10"] }));
    }

    #[test]
    fn test_search_uses_language_context() {
        let body = Search::build_query(search::Variables {
            query: "lisse".to_string(),
            first: 20,
            language: "FR".to_string(),
            metafields: Vec::new(),
        });
        assert!(body.query.contains("@inContext(language: $language)"));
    }

    #[test]
    fn test_search_result_items_by_typename() {
        let data: search::ResponseData = serde_json::from_value(serde_json::json!({
            "search": {
                "totalCount": 2,
                "pageInfo": { "hasNextPage": false, "endCursor": null },
                "nodes": [
                    { "__typename": "Page", "id": "gid://shopify/Page/1", "handle": "faq", "title": "FAQ" },
                    {
                        "__typename": "Article",
                        "id": "gid://shopify/Article/2",
                        "handle": "routine",
                        "title": "Routine",
                        "excerpt": null,
                        "blog": { "handle": "journal" }
                    }
                ]
            }
        }))
        .unwrap();
        assert_eq!(data.search.nodes.len(), 2);
        assert!(matches!(data.search.nodes[0], search::SearchResultItem::Page(_)));
    }
}
