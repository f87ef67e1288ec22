//! Concurrent cart session for one visitor.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::instrument;

use super::action::{CartAction, InvalidAction};
use super::projection::CartProjection;
use super::tracker::{MutationFailure, MutationReport, MutationTracker, Resolution, Ticket};
use crate::shopify::ShopifyError;
use crate::shopify::types::{Cart, CartId, CartMutationPayload};

/// Remote cart operations the session depends on.
///
/// Implemented by [`crate::shopify::StorefrontClient`]; tests use fakes that
/// answer out of order.
pub trait CartBackend: Send + Sync {
    /// Read a cart by ID. `Ok(None)` when Shopify no longer knows the cart.
    fn fetch_cart(
        &self,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<Option<Cart>, ShopifyError>> + Send;

    /// Run one mutation. Without a cart ID the backend creates the cart.
    fn mutate(
        &self,
        cart_id: Option<&CartId>,
        action: &CartAction,
    ) -> impl Future<Output = Result<CartMutationPayload, ShopifyError>> + Send;
}

/// What subscribers see after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    pub cart: CartProjection,
    /// Mutations still awaiting a response.
    pub pending: usize,
    /// Most recent settled mutation.
    pub report: Option<MutationReport>,
}

/// Result of [`CartSession::dispatch`].
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub ticket: Ticket,
    pub resolution: Resolution,
    pub snapshot: CartSnapshot,
}

/// A [`MutationTracker`] shared between request handlers, publishing every
/// projection on a `watch` channel.
#[derive(Debug)]
pub struct CartSession {
    state: Mutex<MutationTracker>,
    updates: watch::Sender<CartSnapshot>,
    /// Held while a mutation runs without a cart ID so only one cart is created.
    creating: tokio::sync::Mutex<()>,
}

impl Default for CartSession {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CartSession {
    #[must_use]
    pub fn new(confirmed: Option<Cart>) -> Self {
        let tracker = MutationTracker::new(confirmed);
        let (updates, _) = watch::channel(tracker.snapshot());
        Self {
            state: Mutex::new(tracker),
            updates,
            creating: tokio::sync::Mutex::new(()),
        }
    }

    fn tracker(&self) -> MutationGuard<'_> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, tracker: &MutationTracker) -> CartSnapshot {
        let snapshot = tracker.snapshot();
        self.updates.send_replace(snapshot.clone());
        snapshot
    }

    /// Receive every snapshot from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.updates.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.updates.borrow().clone()
    }

    #[must_use]
    pub fn cart_id(&self) -> Option<CartId> {
        self.tracker().cart_id().cloned()
    }

    /// Record a submission and publish the optimistic projection.
    pub fn submit(&self, action: CartAction) -> Ticket {
        let mut tracker = self.tracker();
        let ticket = tracker.submit(action);
        if let Some(superseded) = ticket.superseded {
            tracing::debug!(key = %ticket.key, %superseded, token = %ticket.token, "superseded pending mutation");
        }
        self.publish(&tracker);
        ticket
    }

    /// Settle a submission and publish the result.
    pub fn resolve(
        &self,
        ticket: &Ticket,
        outcome: Result<CartMutationPayload, MutationFailure>,
    ) -> (Resolution, CartSnapshot) {
        let mut tracker = self.tracker();
        let resolution = tracker.resolve(ticket, outcome);
        let snapshot = if resolution == Resolution::Superseded {
            tracing::debug!(key = %ticket.key, token = %ticket.token, "discarded stale response");
            tracker.snapshot()
        } else {
            self.publish(&tracker)
        };
        (resolution, snapshot)
    }

    /// Submit, run against the backend, and settle one mutation.
    ///
    /// Errors reported by Shopify end up in the snapshot's report, not here.
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails validation; nothing is sent.
    #[instrument(skip(self, backend, action), fields(kind = %action.kind().as_str()))]
    pub async fn dispatch<B: CartBackend>(
        &self,
        backend: &B,
        action: CartAction,
    ) -> Result<DispatchOutcome, InvalidAction> {
        action.validate()?;
        let ticket = self.submit(action.clone());

        let creation_guard = if self.cart_id().is_none() {
            Some(self.creating.lock().await)
        } else {
            None
        };
        let cart_id = self.cart_id();

        let outcome = backend
            .mutate(cart_id.as_ref(), &action)
            .await
            .map_err(MutationFailure::from);
        if let Err(MutationFailure::Transport(reason)) = &outcome {
            tracing::warn!(key = %ticket.key, "cart mutation failed: {reason}");
        }

        let (resolution, mut snapshot) = self.resolve(&ticket, outcome);
        drop(creation_guard);

        let refresh_due = self.tracker().take_refresh_request();
        if refresh_due && let Some(cart_id) = self.cart_id() {
            match self.refresh(backend, &cart_id).await {
                Ok(refreshed) => snapshot = refreshed,
                Err(e) => tracing::warn!("Failed to refresh cart {cart_id}: {e}"),
            }
        }

        Ok(DispatchOutcome {
            ticket,
            resolution,
            snapshot,
        })
    }

    /// Re-read the cart from Shopify. A mutation response that lands while the
    /// fetch is in flight takes precedence over the fetched cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched.
    pub async fn refresh<B: CartBackend>(
        &self,
        backend: &B,
        cart_id: &CartId,
    ) -> Result<CartSnapshot, ShopifyError> {
        let seen = self.tracker().version();
        let cart = backend.fetch_cart(cart_id).await?;
        let mut tracker = self.tracker();
        if !tracker.replace_confirmed(seen, cart) {
            tracing::debug!(%cart_id, "fetched cart outdated by a mutation response");
        }
        Ok(self.publish(&tracker))
    }
}

type MutationGuard<'a> = MutexGuard<'a, MutationTracker>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::action::AddLine;
    use crate::shopify::types::{
        CartCost, CartLine, CartLineInput, CartMerchandise, CurrencyCode, LineId, MerchandiseId,
        Money,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cart_with(lines: Vec<CartLine>) -> Cart {
        Cart {
            id: CartId::new("gid://shopify/Cart/c1"),
            checkout_url: Some("https://boucle.shop/cart/c/c1".to_string()),
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            cost: CartCost {
                subtotal: Money::zero(CurrencyCode::EUR),
                total: Money::zero(CurrencyCode::EUR),
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

    fn line(id: &str, variant: &str, quantity: u32) -> CartLine {
        CartLine {
            id: LineId::new(id),
            quantity,
            merchandise: CartMerchandise::placeholder(MerchandiseId::new(variant)),
            cost: None,
            attributes: Vec::new(),
            selling_plan_id: None,
            is_optimistic: false,
        }
    }

    /// Answers every add with a cart holding one line per added variant.
    #[derive(Default)]
    struct EchoBackend {
        creates: AtomicUsize,
    }

    impl CartBackend for EchoBackend {
        async fn fetch_cart(&self, _cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
            Ok(Some(cart_with(Vec::new())))
        }

        async fn mutate(
            &self,
            cart_id: Option<&CartId>,
            action: &CartAction,
        ) -> Result<CartMutationPayload, ShopifyError> {
            if cart_id.is_none() {
                self.creates.fetch_add(1, Ordering::SeqCst);
            }
            let lines = match action {
                CartAction::LinesAdd(adds) => adds
                    .iter()
                    .enumerate()
                    .map(|(i, add)| {
                        line(
                            &format!("gid://shopify/CartLine/{i}"),
                            add.input.merchandise_id.as_str(),
                            add.input.quantity,
                        )
                    })
                    .collect(),
                _ => Vec::new(),
            };
            Ok(CartMutationPayload {
                cart: Some(cart_with(lines)),
                ..CartMutationPayload::default()
            })
        }
    }

    #[tokio::test]
    async fn test_dispatch_add_confirms_line() {
        let session = CartSession::default();
        let mut updates = session.subscribe();
        let backend = EchoBackend::default();

        let action = CartAction::LinesAdd(vec![AddLine::new(CartLineInput::new("V1", 1))]);
        let outcome = session.dispatch(&backend, action).await.unwrap();

        assert_eq!(outcome.resolution, Resolution::Applied);
        let cart = &outcome.snapshot.cart;
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines[0].quantity, 1);
        assert!(!cart.lines[0].is_optimistic);
        assert_eq!(outcome.snapshot.pending, 0);
        assert_eq!(backend.creates.load(Ordering::SeqCst), 1);
        assert!(session.cart_id().is_some());

        assert!(updates.has_changed().unwrap());
        assert_eq!(*updates.borrow_and_update(), outcome.snapshot);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_invalid_action() {
        let session = CartSession::default();
        let result = session
            .dispatch(&EchoBackend::default(), CartAction::LinesRemove(Vec::new()))
            .await;
        assert!(result.is_err());
        assert_eq!(session.snapshot().pending, 0);
    }

    #[tokio::test]
    async fn test_refresh_replaces_confirmed() {
        let session = CartSession::new(Some(cart_with(vec![line("L1", "V1", 2)])));
        let id = session.cart_id().unwrap();
        let snapshot = session.refresh(&EchoBackend::default(), &id).await.unwrap();
        assert!(snapshot.cart.is_empty());
    }

    #[test]
    fn test_submit_publishes_optimistic_projection() {
        let session = CartSession::new(Some(cart_with(vec![line("L1", "V1", 2)])));
        let ticket = session.submit(CartAction::update_quantity("L1", 3));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.pending, 1);
        assert_eq!(snapshot.cart.lines[0].quantity, 3);
        assert!(snapshot.cart.is_optimistic);

        let (resolution, snapshot) =
            session.resolve(&ticket, Err(MutationFailure::Transport("timeout".to_string())));
        assert_eq!(resolution, Resolution::Failed);
        assert_eq!(snapshot.cart.lines[0].quantity, 2);
    }
}
