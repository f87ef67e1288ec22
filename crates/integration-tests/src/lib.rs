//! Integration tests for the Boucle storefront.
//!
//! Shared fixtures and in-memory backends. The tests in `tests/` drive
//! [`CartSession`](boucle_storefront::cart::CartSession) and the search
//! fallback through these fakes, so response order is under test control and
//! nothing reaches Shopify.
//!
//! # Test Categories
//!
//! - `cart_coalescing` - last-write-wins, optimistic quantities, error reverts
//! - `cart_removal` - removal wins, cart creation, end-to-end add
//! - `search_fallback` - bilingual expansion and fallback stages
//! - `http_routes` - router wiring without network access

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use boucle_storefront::cart::{CartAction, CartBackend};
use boucle_storefront::config::{
    CartConfig, SearchConfig, SentryConfig, ShopifyStorefrontConfig, StorefrontConfig,
};
use boucle_storefront::locale::Locale;
use boucle_storefront::search::SearchBackend;
use boucle_storefront::shopify::ShopifyError;
use boucle_storefront::shopify::types::{
    Cart, CartCost, CartId, CartLine, CartLineCost, CartMerchandise, CartMerchandiseProduct,
    CartMutationPayload, CurrencyCode, LineId, MerchandiseId, Money, NodeId, PageInfo,
    SearchConnection, SearchNode, SearchProduct,
};
use tokio::sync::{Notify, oneshot};

pub const CART_ID: &str = "gid://shopify/Cart/c1";

// =============================================================================
// Fixtures
// =============================================================================

#[must_use]
pub fn eur(cents: i64) -> Money {
    Money::from_cents(cents, CurrencyCode::EUR)
}

/// A priced variant of a hair-care product.
#[must_use]
pub fn variant(id: &str, price_cents: i64) -> CartMerchandise {
    CartMerchandise {
        id: MerchandiseId::new(id),
        title: "250 ml".to_string(),
        price: Some(eur(price_cents)),
        available_for_sale: true,
        selected_options: Vec::new(),
        image: None,
        product: CartMerchandiseProduct {
            id: None,
            handle: "creme-boucles".to_string(),
            title: "Crème Boucles".to_string(),
        },
    }
}

/// A confirmed line at 14.50 EUR per unit.
#[must_use]
pub fn line(id: &str, variant_id: &str, quantity: u32) -> CartLine {
    let merchandise = variant(variant_id, 1450);
    let cost = merchandise.price.and_then(|unit| {
        let subtotal = unit.times(quantity).ok()?;
        Some(CartLineCost {
            amount_per_quantity: unit,
            subtotal_amount: subtotal,
            total_amount: subtotal,
        })
    });
    CartLine {
        id: LineId::new(id),
        quantity,
        merchandise,
        cost,
        attributes: Vec::new(),
        selling_plan_id: None,
        is_optimistic: false,
    }
}

/// A cart whose totals agree with its lines.
#[must_use]
pub fn cart(lines: Vec<CartLine>) -> Cart {
    let subtotal = Money::sum(lines.iter().filter_map(|l| l.cost.map(|c| c.subtotal_amount)))
        .ok()
        .flatten()
        .unwrap_or_else(|| eur(0));
    Cart {
        id: CartId::new(CART_ID),
        checkout_url: Some("https://boucle.shop/cart/c/c1".to_string()),
        total_quantity: lines.iter().map(|l| l.quantity).sum(),
        cost: CartCost {
            subtotal,
            total: subtotal,
            total_tax: None,
        },
        lines,
        discount_codes: Vec::new(),
        applied_gift_cards: Vec::new(),
        buyer_identity: None,
        note: None,
        updated_at: None,
    }
}

/// A successful mutation payload carrying `cart`.
#[must_use]
pub fn applied(cart: Cart) -> CartMutationPayload {
    CartMutationPayload {
        cart: Some(cart),
        ..CartMutationPayload::default()
    }
}

/// Configuration pointing at a store that is never contacted.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: url::Url::parse("http://localhost:3000").expect("valid base URL"),
        shopify: ShopifyStorefrontConfig {
            store: "boucle-test.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_private_token: secrecy::SecretString::from("shpat_test_token"),
        },
        search: SearchConfig::default(),
        cart: CartConfig::default(),
        default_locale: Locale::Fr,
        sentry: SentryConfig::default(),
    }
}

// =============================================================================
// Gated cart backend
// =============================================================================

type Reply = Result<CartMutationPayload, ShopifyError>;

/// One mutation waiting for the test to answer it.
#[derive(Debug)]
pub struct PendingCall {
    pub cart_id: Option<CartId>,
    pub action: CartAction,
    reply: oneshot::Sender<Reply>,
}

impl PendingCall {
    /// Deliver the response. Ignored if the caller went away.
    pub fn respond(self, reply: Reply) {
        let _ = self.reply.send(reply);
    }
}

/// Cart backend whose mutations block until the test answers them, in any
/// order it likes.
#[derive(Debug, Default)]
pub struct GatedBackend {
    calls: Mutex<VecDeque<PendingCall>>,
    arrived: Notify,
    remote: Mutex<Option<Cart>>,
    fetches: Mutex<usize>,
}

impl GatedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cart returned by `fetch_cart`.
    pub fn set_remote(&self, cart: Option<Cart>) {
        *self.remote.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = cart;
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Wait for the next mutation to reach the backend.
    pub async fn next_call(&self) -> PendingCall {
        loop {
            if let Some(call) = self
                .calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .pop_front()
            {
                return call;
            }
            self.arrived.notified().await;
        }
    }
}

impl CartBackend for GatedBackend {
    async fn fetch_cart(&self, _cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        *self.fetches.lock().unwrap_or_else(std::sync::PoisonError::into_inner) += 1;
        Ok(self
            .remote
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    async fn mutate(&self, cart_id: Option<&CartId>, action: &CartAction) -> Reply {
        let (reply, response) = oneshot::channel();
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(PendingCall {
                cart_id: cart_id.cloned(),
                action: action.clone(),
                reply,
            });
        self.arrived.notify_one();
        response
            .await
            .unwrap_or_else(|_| Err(ShopifyError::NotFound("response".to_string())))
    }
}

// =============================================================================
// Scripted catalog
// =============================================================================

/// Search backend answering from a fixed query → product handles table and
/// recording every query it receives.
#[derive(Debug, Default)]
pub struct ScriptedCatalog {
    answers: HashMap<String, Vec<String>>,
    failing: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with products for `handles`.
    #[must_use]
    pub fn answer(mut self, query: &str, handles: &[&str]) -> Self {
        self.answers.insert(
            query.to_string(),
            handles.iter().map(|h| (*h).to_string()).collect(),
        );
        self
    }

    /// Fail `query` with a GraphQL error.
    #[must_use]
    pub fn fail(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }

    /// Queries received, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// Product search hit whose node ID derives from its handle.
#[must_use]
pub fn product(handle: &str) -> SearchNode {
    SearchNode::Product(SearchProduct {
        id: NodeId::new(format!("gid://shopify/Product/{handle}")),
        handle: handle.to_string(),
        title: handle.replace('-', " "),
        vendor: "Boucle".to_string(),
        price: Some(eur(1450)),
        image: None,
        available_for_sale: true,
        subtitle: None,
    })
}

impl SearchBackend for ScriptedCatalog {
    async fn search(
        &self,
        query: &str,
        _first: u16,
        _locale: Locale,
    ) -> Result<SearchConnection, ShopifyError> {
        self.queries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(query.to_string());
        if self.failing.iter().any(|q| q == query) {
            return Err(ShopifyError::GraphQL(Vec::new()));
        }
        let nodes: Vec<SearchNode> = self
            .answers
            .get(query)
            .map(|handles| handles.iter().map(|h| product(h)).collect())
            .unwrap_or_default();
        Ok(SearchConnection {
            total_count: u64::try_from(nodes.len()).unwrap_or(u64::MAX),
            nodes,
            page_info: PageInfo::default(),
        })
    }
}
