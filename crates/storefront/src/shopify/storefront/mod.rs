//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` query bodies with `reqwest` 0.13 for HTTP.
//! Caches search responses using `moka` (5-minute TTL). Carts are never cached.

mod cache;
mod conversions;

pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::cart::{CartAction, CartBackend};
use crate::config::ShopifyStorefrontConfig;
use crate::locale::Locale;
use crate::search::SearchBackend;
use crate::shopify::metafields::REQUESTED;
use crate::shopify::types::{
    Attribute, BuyerIdentityInput, Cart, CartId, CartLineInput, CartLineUpdateInput,
    CartMutationPayload, LineId, SearchConnection,
};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::{CacheKey, CacheValue};
use conversions::{convert_cart, convert_payload, convert_search};
use queries::{
    AttributeNode, BuyerIdentityInputNode, CartBuyerIdentityUpdate, CartCreate,
    CartDiscountCodesUpdate, CartGiftCardCodesUpdate, CartInputNode, CartLineInputNode,
    CartLineUpdateInputNode, CartLinesAdd, CartLinesRemove, CartLinesUpdate, GetCart, Search,
    cart_buyer_identity_update, cart_create, cart_discount_codes_update,
    cart_gift_card_codes_update, cart_lines_add, cart_lines_remove, cart_lines_update, get_cart,
    search,
};

const SEARCH_CACHE_CAPACITY: u64 = 1000;
const SEARCH_CACHE_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides cart operations and localized catalog search.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(SEARCH_CACHE_CAPACITY)
            .time_to_live(SEARCH_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint(),
                access_token: config.storefront_private_token.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![GraphQLError {
                message: format!("HTTP {status}: {}", truncate(&response_text, 200)),
                locations: vec![],
                path: vec![],
            }]));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }

    // =========================================================================
    // Search Methods
    // =========================================================================

    /// Run one catalog search in the visitor's language.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or a price cannot be parsed.
    #[instrument(skip(self), fields(query = %query, locale = %locale))]
    pub async fn search_catalog(
        &self,
        query: &str,
        first: u16,
        locale: Locale,
    ) -> Result<SearchConnection, ShopifyError> {
        let cache_key = CacheKey::Search {
            query: query.to_string(),
            first,
            locale,
        };

        if let Some(CacheValue::Search(results)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for search");
            return Ok(results);
        }

        let variables = search::Variables {
            query: query.to_string(),
            first: i64::from(first),
            language: locale.language_code().to_string(),
            metafields: REQUESTED
                .iter()
                .map(|key| search::MetafieldIdentifier {
                    namespace: key.namespace.to_string(),
                    key: key.key.to_string(),
                })
                .collect(),
        };

        let data = self.execute::<Search>(variables).await?;
        let results = convert_search(data.search, locale)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Search(results.clone()))
            .await;

        Ok(results)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get an existing cart. `Ok(None)` if Shopify no longer knows it
    /// (expired or completed).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: cart_id.to_string(),
        };

        let data = self.execute::<GetCart>(variables).await?;
        data.cart.map(convert_cart).transpose()
    }

    /// Create a cart, seeded with whatever the first action carries.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. User errors are returned in
    /// the payload.
    #[instrument(skip(self, input))]
    pub async fn create_cart(
        &self,
        input: CartInputNode,
    ) -> Result<CartMutationPayload, ShopifyError> {
        let data = self
            .execute::<CartCreate>(cart_create::Variables { input })
            .await?;
        convert_payload(data, "cartCreate")
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: &[CartLineInput],
    ) -> Result<CartMutationPayload, ShopifyError> {
        let variables = cart_lines_add::Variables {
            cart_id: cart_id.to_string(),
            lines: lines.iter().map(line_input).collect(),
        };
        let data = self.execute::<CartLinesAdd>(variables).await?;
        convert_payload(data, "cartLinesAdd")
    }

    /// Set line quantities. Quantity 0 removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[CartLineUpdateInput],
    ) -> Result<CartMutationPayload, ShopifyError> {
        let variables = cart_lines_update::Variables {
            cart_id: cart_id.to_string(),
            lines: lines
                .iter()
                .map(|line| CartLineUpdateInputNode {
                    id: line.id.to_string(),
                    quantity: line.quantity,
                })
                .collect(),
        };
        let data = self.execute::<CartLinesUpdate>(variables).await?;
        convert_payload(data, "cartLinesUpdate")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[LineId],
    ) -> Result<CartMutationPayload, ShopifyError> {
        let variables = cart_lines_remove::Variables {
            cart_id: cart_id.to_string(),
            line_ids: line_ids.iter().map(ToString::to_string).collect(),
        };
        let data = self.execute::<CartLinesRemove>(variables).await?;
        convert_payload(data, "cartLinesRemove")
    }

    /// Replace the discount codes on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, discount_codes), fields(cart_id = %cart_id))]
    pub async fn update_discount_codes(
        &self,
        cart_id: &CartId,
        discount_codes: Vec<String>,
    ) -> Result<CartMutationPayload, ShopifyError> {
        let variables = cart_discount_codes_update::Variables {
            cart_id: cart_id.to_string(),
            discount_codes,
        };
        let data = self.execute::<CartDiscountCodesUpdate>(variables).await?;
        convert_payload(data, "cartDiscountCodesUpdate")
    }

    /// Replace the gift card codes on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, gift_card_codes), fields(cart_id = %cart_id))]
    pub async fn update_gift_card_codes(
        &self,
        cart_id: &CartId,
        gift_card_codes: Vec<String>,
    ) -> Result<CartMutationPayload, ShopifyError> {
        let variables = cart_gift_card_codes_update::Variables {
            cart_id: cart_id.to_string(),
            gift_card_codes,
        };
        let data = self.execute::<CartGiftCardCodesUpdate>(variables).await?;
        convert_payload(data, "cartGiftCardCodesUpdate")
    }

    /// Update the buyer identity on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, buyer_identity), fields(cart_id = %cart_id))]
    pub async fn update_buyer_identity(
        &self,
        cart_id: &CartId,
        buyer_identity: &BuyerIdentityInput,
    ) -> Result<CartMutationPayload, ShopifyError> {
        let variables = cart_buyer_identity_update::Variables {
            cart_id: cart_id.to_string(),
            buyer_identity: buyer_identity_input(buyer_identity),
        };
        let data = self.execute::<CartBuyerIdentityUpdate>(variables).await?;
        convert_payload(data, "cartBuyerIdentityUpdate")
    }

    /// Run a cart action, creating the cart when there is none yet.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` for line updates and removals without
    /// a cart, or any API error.
    pub async fn apply(
        &self,
        cart_id: Option<&CartId>,
        action: &CartAction,
    ) -> Result<CartMutationPayload, ShopifyError> {
        let Some(cart_id) = cart_id else {
            return self.create_cart(create_input(action)?).await;
        };
        match action {
            CartAction::LinesAdd(lines) => {
                let inputs: Vec<CartLineInput> = lines.iter().map(|l| l.input.clone()).collect();
                self.add_lines(cart_id, &inputs).await
            }
            CartAction::LinesUpdate(lines) => self.update_lines(cart_id, lines).await,
            CartAction::LinesRemove(ids) => self.remove_lines(cart_id, ids).await,
            CartAction::DiscountCodesUpdate(codes) => {
                self.update_discount_codes(cart_id, codes.clone()).await
            }
            CartAction::GiftCardCodesUpdate(codes) => {
                self.update_gift_card_codes(cart_id, codes.clone()).await
            }
            CartAction::BuyerIdentityUpdate(input) => {
                self.update_buyer_identity(cart_id, input).await
            }
        }
    }
}

impl CartBackend for StorefrontClient {
    async fn fetch_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        self.get_cart(cart_id).await
    }

    async fn mutate(
        &self,
        cart_id: Option<&CartId>,
        action: &CartAction,
    ) -> Result<CartMutationPayload, ShopifyError> {
        self.apply(cart_id, action).await
    }
}

impl SearchBackend for StorefrontClient {
    async fn search(
        &self,
        query: &str,
        first: u16,
        locale: Locale,
    ) -> Result<SearchConnection, ShopifyError> {
        self.search_catalog(query, first, locale).await
    }
}

// =============================================================================
// Input Conversions
// =============================================================================

fn attribute_input(attribute: &Attribute) -> AttributeNode {
    AttributeNode {
        key: attribute.key.clone(),
        value: attribute.value.clone(),
    }
}

fn line_input(line: &CartLineInput) -> CartLineInputNode {
    CartLineInputNode {
        merchandise_id: line.merchandise_id.to_string(),
        quantity: line.quantity,
        selling_plan_id: line.selling_plan_id.as_ref().map(ToString::to_string),
        attributes: line.attributes.iter().map(attribute_input).collect(),
    }
}

fn buyer_identity_input(input: &BuyerIdentityInput) -> BuyerIdentityInputNode {
    BuyerIdentityInputNode {
        email: input.email.as_ref().map(ToString::to_string),
        phone: input.phone.clone(),
        country_code: input.country_code.as_ref().map(|c| c.to_ascii_uppercase()),
    }
}

/// `cartCreate` input for the first action of a visitor without a cart.
fn create_input(action: &CartAction) -> Result<CartInputNode, ShopifyError> {
    let mut input = CartInputNode::default();
    match action {
        CartAction::LinesAdd(lines) => {
            input.lines = lines.iter().map(|l| line_input(&l.input)).collect();
        }
        CartAction::DiscountCodesUpdate(codes) => input.discount_codes = Some(codes.clone()),
        CartAction::GiftCardCodesUpdate(codes) => input.gift_card_codes = Some(codes.clone()),
        CartAction::BuyerIdentityUpdate(buyer) => {
            input.buyer_identity = Some(buyer_identity_input(buyer));
        }
        CartAction::LinesUpdate(_) | CartAction::LinesRemove(_) => {
            return Err(ShopifyError::NotFound("cart".to_string()));
        }
    }
    Ok(input)
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

fn truncate(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
