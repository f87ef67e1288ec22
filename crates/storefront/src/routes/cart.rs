//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation goes through the visitor's [`CartSession`], which shows the
//! optimistic cart immediately and settles it when Shopify answers. Mutation
//! responses carry an `HX-Trigger: cart-updated` header so badges refresh.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::cart::{AddLine, CartAction, CartProjection, CartSession, CartSnapshot};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::locale::{Labels, Locale};
use crate::middleware::{CurrentLocale, Visitor};
use crate::shopify::types::{BuyerIdentityInput, CartLine, CartLineInput, Email, SellingPlanId};
use crate::state::AppState;

/// HTMX event emitted after every cart mutation.
pub const CART_UPDATED_TRIGGER: &str = "cart-updated";

// =============================================================================
// View Models
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct LineView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub price: Option<String>,
    pub line_price: Option<String>,
    pub image_url: Option<String>,
    pub image_alt: String,
    /// Not yet confirmed by Shopify.
    pub is_optimistic: bool,
}

impl LineView {
    /// The decrement control is disabled at quantity 1; removal is explicit.
    #[must_use]
    pub const fn decrement_disabled(&self) -> bool {
        self.quantity <= 1
    }

    #[must_use]
    pub const fn decremented(&self) -> u32 {
        if self.quantity > 1 { self.quantity - 1 } else { 1 }
    }

    #[must_use]
    pub const fn incremented(&self) -> u32 {
        self.quantity.saturating_add(1)
    }
}

impl From<&CartLine> for LineView {
    fn from(line: &CartLine) -> Self {
        let merchandise = &line.merchandise;
        Self {
            id: line.id.to_string(),
            handle: merchandise.product.handle.clone(),
            title: merchandise.product.title.clone(),
            variant_title: merchandise.display_title().map(str::to_string),
            quantity: line.quantity,
            price: line
                .cost
                .as_ref()
                .map(|c| c.amount_per_quantity)
                .or(merchandise.price)
                .map(|m| m.to_string()),
            line_price: line.cost.as_ref().map(|c| c.total_amount.to_string()),
            image_url: merchandise.image.as_ref().map(|img| img.url.clone()),
            image_alt: merchandise
                .image
                .as_ref()
                .and_then(|img| img.alt_text.clone())
                .unwrap_or_else(|| merchandise.product.title.clone()),
            is_optimistic: line.is_optimistic,
        }
    }
}

/// Applied discount code display data.
#[derive(Debug, Clone)]
pub struct CodeView {
    pub code: String,
    pub applicable: bool,
}

/// Cart display data for templates.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub lines: Vec<LineView>,
    pub line_count: usize,
    pub total_quantity: u32,
    pub subtotal: Option<String>,
    pub total: Option<String>,
    /// Costs were recomputed locally and await Shopify's figures.
    pub estimated: bool,
    pub has_checkout: bool,
    pub discount_codes: Vec<CodeView>,
    /// Masked gift card codes (`•••• 1234`).
    pub gift_cards: Vec<String>,
    pub email: String,
    pub phone: String,
    pub country_code: String,
    /// Mutations still awaiting a response.
    pub pending: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub const fn is_updating(&self) -> bool {
        self.pending > 0
    }

    /// Comma-separated discount codes for the edit form.
    #[must_use]
    pub fn discount_code_list(&self) -> String {
        self.discount_codes
            .iter()
            .map(|c| c.code.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<&CartProjection> for CartView {
    fn from(cart: &CartProjection) -> Self {
        let buyer = cart.buyer_identity.as_ref();
        Self {
            lines: cart
                .lines
                .iter()
                .filter(|line| line.quantity > 0)
                .map(LineView::from)
                .collect(),
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity,
            subtotal: cart.cost.map(|c| c.subtotal.to_string()),
            total: cart.cost.map(|c| c.total.to_string()),
            estimated: cart.cost.is_some_and(|c| c.estimated),
            has_checkout: cart.checkout_url.is_some(),
            discount_codes: cart
                .discount_codes
                .iter()
                .map(|c| CodeView {
                    code: c.code.clone(),
                    applicable: c.applicable,
                })
                .collect(),
            gift_cards: cart
                .applied_gift_cards
                .iter()
                .map(|g| format!("•••• {}", g.last_characters))
                .collect(),
            email: buyer.and_then(|b| b.email.clone()).unwrap_or_default(),
            phone: buyer.and_then(|b| b.phone.clone()).unwrap_or_default(),
            country_code: buyer
                .and_then(|b| b.country_code.clone())
                .unwrap_or_default(),
            pending: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl From<&CartSnapshot> for CartView {
    fn from(snapshot: &CartSnapshot) -> Self {
        let mut view = Self::from(&snapshot.cart);
        view.pending = snapshot.pending;
        if let Some(report) = &snapshot.report {
            view.errors = report.errors.iter().map(|e| e.message.clone()).collect();
            view.warnings = report.warnings.iter().map(|w| w.message.clone()).collect();
        }
        view
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub locale: Locale,
    pub labels: &'static Labels,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub labels: &'static Labels,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
    pub selling_plan_id: Option<String>,
}

/// Update cart line form data.
#[derive(Debug, Deserialize)]
pub struct UpdateLineForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove cart line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveLineForm {
    pub line_id: String,
}

/// Discount or gift card codes, comma or whitespace separated.
#[derive(Debug, Deserialize)]
pub struct CodesForm {
    #[serde(default)]
    pub codes: String,
}

impl CodesForm {
    fn split(&self) -> impl Iterator<Item = &str> {
        self.codes.split([',', ' ', '\n']).filter(|c| !c.is_empty())
    }
}

/// Buyer identity form data. Blank fields are left unset.
#[derive(Debug, Deserialize)]
pub struct BuyerIdentityForm {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

impl BuyerIdentityForm {
    fn into_input(self) -> Result<BuyerIdentityInput> {
        let email = non_blank(self.email)
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let country_code = non_blank(self.country_code);
        if let Some(code) = &country_code
            && !(code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(AppError::BadRequest(format!("invalid country code: {code}")));
        }
        Ok(BuyerIdentityInput {
            email,
            phone: non_blank(self.phone),
            country_code,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Session Helpers
// =============================================================================

/// The visitor's cart session, re-reading the remembered cart if the session
/// was evicted since the last request.
async fn cart_session(state: &AppState, visitor: &Visitor) -> Arc<CartSession> {
    let session = state.carts().get_or_create(visitor.id()).await;
    if session.cart_id().is_none()
        && let Some(cart_id) = visitor.cart_id().await
    {
        match session.refresh(state.storefront(), &cart_id).await {
            Ok(snapshot) if snapshot.cart.id.is_none() => {
                tracing::info!(%cart_id, "remembered cart no longer exists");
                if let Err(e) = visitor.clear_cart_id().await {
                    tracing::error!("Failed to clear cart ID from session: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to fetch cart {cart_id}: {e}"),
        }
    }
    session
}

/// Run one action and remember a newly created cart.
async fn dispatch(state: &AppState, visitor: &Visitor, action: CartAction) -> Result<CartSnapshot> {
    let session = cart_session(state, visitor).await;
    let kind = action.kind();
    let outcome = session.dispatch(state.storefront(), action).await?;

    if let Some(cart_id) = &outcome.snapshot.cart.id
        && visitor.cart_id().await.as_ref() != Some(cart_id)
        && let Err(e) = visitor.set_cart_id(cart_id).await
    {
        tracing::error!("Failed to save cart ID to session: {e}");
    }

    if let Some(report) = &outcome.snapshot.report
        && report.key == outcome.ticket.key
        && !report.is_success()
    {
        tracing::info!(
            kind = kind.as_str(),
            status = ?report.status,
            errors = report.errors.len(),
            "cart mutation not applied"
        );
    }
    add_breadcrumb("cart", kind.as_str(), None);

    Ok(outcome.snapshot)
}

fn items_updated(snapshot: &CartSnapshot, locale: Locale) -> Response {
    (
        AppendHeaders([("HX-Trigger", CART_UPDATED_TRIGGER)]),
        CartItemsTemplate {
            cart: CartView::from(snapshot),
            labels: locale.labels(),
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, visitor))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    CurrentLocale(locale): CurrentLocale,
) -> impl IntoResponse {
    let session = cart_session(&state, &visitor).await;

    let snapshot = match session.cart_id() {
        Some(cart_id) => match session.refresh(state.storefront(), &cart_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Failed to refresh cart {cart_id}: {e}");
                session.snapshot()
            }
        },
        None => session.snapshot(),
    };

    CartShowTemplate {
        cart: CartView::from(&snapshot),
        locale,
        labels: locale.labels(),
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, visitor))]
pub async fn count(State(state): State<AppState>, visitor: Visitor) -> impl IntoResponse {
    let session = cart_session(&state, &visitor).await;
    CartCountTemplate {
        count: session.snapshot().cart.total_quantity,
    }
}

/// Add a variant to the cart (HTMX).
///
/// Creates the cart on first use. Returns the count badge.
#[instrument(skip(state, visitor))]
pub async fn add_lines(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let mut input = CartLineInput::new(form.variant_id, form.quantity.unwrap_or(1));
    input.selling_plan_id = non_blank(form.selling_plan_id).map(SellingPlanId::new);

    let snapshot = dispatch(&state, &visitor, CartAction::LinesAdd(vec![AddLine::new(input)])).await?;

    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED_TRIGGER)]),
        CartCountTemplate {
            count: snapshot.cart.total_quantity,
        },
    )
        .into_response())
}

/// Set a line's quantity (HTMX). Zero removes the line.
#[instrument(skip(state, visitor))]
pub async fn update_lines(
    State(state): State<AppState>,
    visitor: Visitor,
    CurrentLocale(locale): CurrentLocale,
    Form(form): Form<UpdateLineForm>,
) -> Result<Response> {
    let action = CartAction::update_quantity(form.line_id, form.quantity);
    let snapshot = dispatch(&state, &visitor, action).await?;
    Ok(items_updated(&snapshot, locale))
}

/// Remove a line (HTMX).
#[instrument(skip(state, visitor))]
pub async fn remove_lines(
    State(state): State<AppState>,
    visitor: Visitor,
    CurrentLocale(locale): CurrentLocale,
    Form(form): Form<RemoveLineForm>,
) -> Result<Response> {
    let snapshot = dispatch(&state, &visitor, CartAction::remove_line(form.line_id)).await?;
    Ok(items_updated(&snapshot, locale))
}

/// Replace the discount codes (HTMX).
#[instrument(skip(state, visitor))]
pub async fn discount_codes(
    State(state): State<AppState>,
    visitor: Visitor,
    CurrentLocale(locale): CurrentLocale,
    Form(form): Form<CodesForm>,
) -> Result<Response> {
    let action = CartAction::discount_codes(form.split());
    let snapshot = dispatch(&state, &visitor, action).await?;
    Ok(items_updated(&snapshot, locale))
}

/// Replace the gift card codes (HTMX).
#[instrument(skip(state, visitor, form))]
pub async fn gift_card_codes(
    State(state): State<AppState>,
    visitor: Visitor,
    CurrentLocale(locale): CurrentLocale,
    Form(form): Form<CodesForm>,
) -> Result<Response> {
    let action = CartAction::gift_card_codes(form.split());
    let snapshot = dispatch(&state, &visitor, action).await?;
    Ok(items_updated(&snapshot, locale))
}

/// Update the buyer's contact details (HTMX).
#[instrument(skip(state, visitor, form))]
pub async fn buyer_identity(
    State(state): State<AppState>,
    visitor: Visitor,
    CurrentLocale(locale): CurrentLocale,
    Form(form): Form<BuyerIdentityForm>,
) -> Result<Response> {
    let action = CartAction::BuyerIdentityUpdate(form.into_input()?);
    let snapshot = dispatch(&state, &visitor, action).await?;
    Ok(items_updated(&snapshot, locale))
}

/// Redirect to Shopify checkout.
///
/// Aborts back to the cart page when the cart has no usable checkout URL.
#[instrument(skip(state, visitor))]
pub async fn checkout(State(state): State<AppState>, visitor: Visitor) -> Response {
    let session = cart_session(&state, &visitor).await;
    let Some(cart_id) = session.cart_id() else {
        return Redirect::to("/cart").into_response();
    };

    let snapshot = match session.refresh(state.storefront(), &cart_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!("Failed to get cart for checkout: {e}");
            return Redirect::to("/cart").into_response();
        }
    };

    match checkout_target(&snapshot.cart) {
        Some(url) => {
            add_breadcrumb("cart", "checkout", Some(&[("cart_id", cart_id.as_str())]));
            Redirect::to(url.as_str()).into_response()
        }
        None => {
            tracing::warn!(
                %cart_id,
                checkout_url = ?snapshot.cart.checkout_url,
                "cart has no usable checkout URL"
            );
            Redirect::to("/cart").into_response()
        }
    }
}

/// The checkout URL, if present and an absolute http(s) URL, for a non-empty cart.
fn checkout_target(cart: &CartProjection) -> Option<Url> {
    if cart.is_empty() {
        return None;
    }
    let url = Url::parse(cart.checkout_url.as_deref()?).ok()?;
    matches!(url.scheme(), "https" | "http").then_some(url)
}
