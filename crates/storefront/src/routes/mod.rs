//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page (refreshes the confirmed cart)
//! GET  /cart/count             - Cart count badge (fragment)
//! POST /cart/lines/add         - Add a variant (returns count, triggers cart-updated)
//! POST /cart/lines/update      - Set quantity (returns cart_items fragment)
//! POST /cart/lines/remove      - Remove line (returns cart_items fragment)
//! POST /cart/discount-codes    - Replace discount codes
//! POST /cart/gift-card-codes   - Replace gift card codes
//! POST /cart/buyer-identity    - Update contact details
//!
//! # Checkout
//! GET  /checkout               - Redirect to Shopify checkout
//!
//! # Search
//! GET  /search?q=              - Expanded search with fallback
//!
//! # Locale
//! POST /locale                 - Switch language (triggers locale-changed)
//! ```

pub mod cart;
pub mod locale;
pub mod search;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/lines/add", post(cart::add_lines))
        .route("/lines/update", post(cart::update_lines))
        .route("/lines/remove", post(cart::remove_lines))
        .route("/discount-codes", post(cart::discount_codes))
        .route("/gift-card-codes", post(cart::gift_card_codes))
        .route("/buyer-identity", post(cart::buyer_identity))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout redirect
        .route("/checkout", get(cart::checkout))
        .route("/search", get(search::search_page))
        .route("/locale", post(locale::switch))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Shopify.
async fn health() -> &'static str {
    "ok"
}
