//! Pending mutation bookkeeping.
//!
//! The tracker maps each coalescing key to the most recently submitted
//! request for that key. A response is only applied if its token still
//! matches; anything else is a superseded request and is dropped, except that
//! a superseded `cartCreate` answer still establishes the cart.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::action::{CartAction, CartActionKind};
use super::key::CoalescingKey;
use super::projection::{CartProjection, project};
use super::session::CartSnapshot;
use crate::shopify::ShopifyError;
use crate::shopify::types::{Cart, CartId, CartMutationPayload, CartUserError, CartWarning, LineId};

/// Monotonic identifier of one submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(u64);

impl RequestToken {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receipt for a submission, handed back to [`MutationTracker::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub key: CoalescingKey,
    pub token: RequestToken,
    pub kind: CartActionKind,
    /// Request this submission superseded, if one was in flight.
    pub superseded: Option<RequestToken>,
}

#[derive(Debug, Clone)]
struct PendingMutation {
    token: RequestToken,
    action: CartAction,
}

/// Why a mutation did not produce a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationFailure {
    /// The request did not complete.
    Transport(String),
    /// Shopify answered with user errors.
    Rejected(Vec<CartUserError>),
}

impl From<ShopifyError> for MutationFailure {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::UserErrors(errors) => Self::Rejected(errors),
            ShopifyError::NotFound(what) => Self::Rejected(vec![CartUserError {
                code: Some("NOT_FOUND".to_string()),
                field: Vec::new(),
                message: format!("Not found: {what}"),
            }]),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Outcome of one settled mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    Applied,
    Rejected,
    Failed,
}

/// What [`MutationTracker::resolve`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The response cart became the confirmed cart.
    Applied,
    /// Shopify rejected the mutation; the projection reverted.
    Rejected,
    /// Transport failure or malformed response; the projection reverted.
    Failed,
    /// A newer request holds the key; the response was dropped.
    Superseded,
}

impl From<MutationStatus> for Resolution {
    fn from(status: MutationStatus) -> Self {
        match status {
            MutationStatus::Applied => Self::Applied,
            MutationStatus::Rejected => Self::Rejected,
            MutationStatus::Failed => Self::Failed,
        }
    }
}

/// Errors and warnings from the most recent settled mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReport {
    pub kind: CartActionKind,
    pub key: CoalescingKey,
    pub status: MutationStatus,
    pub errors: Vec<CartUserError>,
    pub warnings: Vec<CartWarning>,
}

impl MutationReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Applied
    }
}

/// Confirmed cart plus in-flight mutations for one visitor.
#[derive(Debug, Default)]
pub struct MutationTracker {
    confirmed: Option<Cart>,
    pending: HashMap<CoalescingKey, PendingMutation>,
    next_token: u64,
    /// Bumped every time the confirmed cart changes.
    version: u64,
    /// Lines whose removal Shopify confirmed while other requests were in flight.
    removed: HashSet<LineId>,
    needs_refresh: bool,
    last_report: Option<MutationReport>,
}

impl MutationTracker {
    #[must_use]
    pub fn new(confirmed: Option<Cart>) -> Self {
        Self {
            confirmed,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn confirmed(&self) -> Option<&Cart> {
        self.confirmed.as_ref()
    }

    #[must_use]
    pub fn cart_id(&self) -> Option<&CartId> {
        self.confirmed.as_ref().map(|cart| &cart.id)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub const fn last_report(&self) -> Option<&MutationReport> {
        self.last_report.as_ref()
    }

    /// Record a submission. Any pending request with the same key loses
    /// authority immediately.
    pub fn submit(&mut self, action: CartAction) -> Ticket {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        let key = action.key();
        let kind = action.kind();
        let superseded = self
            .pending
            .insert(key.clone(), PendingMutation { token, action })
            .map(|old| old.token);
        Ticket {
            key,
            token,
            kind,
            superseded,
        }
    }

    /// Settle a request with Shopify's answer.
    pub fn resolve(
        &mut self,
        ticket: &Ticket,
        outcome: Result<CartMutationPayload, MutationFailure>,
    ) -> Resolution {
        let current = self.pending.get(&ticket.key).map(|p| p.token);
        if current != Some(ticket.token) {
            // A stale answer may still be the one that created the cart; later
            // requests must target it rather than create another.
            if self.confirmed.is_none()
                && let Ok(CartMutationPayload {
                    cart: Some(cart),
                    user_errors,
                    ..
                }) = outcome
                && user_errors.is_empty()
            {
                self.apply_confirmed(cart);
            }
            return Resolution::Superseded;
        }
        let Some(settled) = self.pending.remove(&ticket.key) else {
            return Resolution::Superseded;
        };

        let (status, errors, warnings) = match outcome {
            Ok(payload) if !payload.user_errors.is_empty() => {
                (MutationStatus::Rejected, payload.user_errors, payload.warnings)
            }
            Ok(CartMutationPayload {
                cart: Some(cart),
                warnings,
                ..
            }) => {
                if let CartAction::LinesRemove(ids) = &settled.action {
                    self.removed.extend(ids.iter().cloned());
                }
                self.apply_confirmed(cart);
                (MutationStatus::Applied, Vec::new(), warnings)
            }
            Ok(payload) => (MutationStatus::Failed, Vec::new(), payload.warnings),
            Err(MutationFailure::Rejected(errors)) => (MutationStatus::Rejected, errors, Vec::new()),
            Err(MutationFailure::Transport(_)) => (MutationStatus::Failed, Vec::new(), Vec::new()),
        };

        self.last_report = Some(MutationReport {
            kind: ticket.kind,
            key: ticket.key.clone(),
            status,
            errors,
            warnings,
        });

        if self.pending.is_empty() {
            self.removed.clear();
        }
        status.into()
    }

    /// Replace the confirmed cart with a freshly fetched one, unless a
    /// mutation response replaced it since `seen_version` was read.
    pub fn replace_confirmed(&mut self, seen_version: u64, cart: Option<Cart>) -> bool {
        if seen_version != self.version {
            return false;
        }
        self.needs_refresh = false;
        match cart {
            Some(cart) => self.apply_confirmed(cart),
            None => {
                self.confirmed = None;
                self.version += 1;
            }
        }
        true
    }

    /// Whether a re-fetch is due; clears the flag.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_refresh)
    }

    /// Displayed cart: confirmed cart with pending mutations in submission order.
    #[must_use]
    pub fn projection(&self) -> CartProjection {
        let mut pending: Vec<&PendingMutation> = self.pending.values().collect();
        pending.sort_by_key(|p| p.token);
        project(
            self.confirmed.as_ref(),
            pending.into_iter().map(|p| (p.token, &p.action)),
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            cart: self.projection(),
            pending: self.pending.len(),
            report: self.last_report.clone(),
        }
    }

    /// Confirmed removals stay removed: a response computed before the
    /// removal reached Shopify may still carry the line.
    fn apply_confirmed(&mut self, mut cart: Cart) {
        let before = cart.lines.len();
        cart.lines.retain(|line| !self.removed.contains(&line.id));
        if cart.lines.len() != before {
            cart.total_quantity = cart.lines.iter().map(|l| l.quantity).sum();
            self.needs_refresh = true;
        }
        self.confirmed = Some(cart);
        self.version += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::AddLine;
    use crate::shopify::types::{
        CartCost, CartLine, CartLineInput, CartMerchandise, CurrencyCode, MerchandiseId, Money,
    };

    fn eur(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::EUR)
    }

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine {
            id: LineId::new(id),
            quantity,
            merchandise: CartMerchandise::placeholder(MerchandiseId::new(format!("V-{id}"))),
            cost: None,
            attributes: Vec::new(),
            selling_plan_id: None,
            is_optimistic: false,
        }
    }

    fn cart(lines: Vec<CartLine>) -> Cart {
        Cart {
            id: CartId::new("gid://shopify/Cart/c1"),
            checkout_url: None,
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            cost: CartCost {
                subtotal: eur(0),
                total: eur(0),
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

    fn applied(cart: Cart) -> Result<CartMutationPayload, MutationFailure> {
        Ok(CartMutationPayload {
            cart: Some(cart),
            ..CartMutationPayload::default()
        })
    }

    fn quantity_of(tracker: &MutationTracker, id: &str) -> Option<u32> {
        tracker
            .projection()
            .line(&LineId::new(id))
            .map(|l| l.quantity)
    }

    #[test]
    fn test_same_key_supersedes() {
        let mut tracker = MutationTracker::new(Some(cart(vec![line("L1", 2)])));
        let first = tracker.submit(CartAction::update_quantity("L1", 3));
        let second = tracker.submit(CartAction::update_quantity("L1", 4));

        assert_eq!(second.superseded, Some(first.token));
        assert_eq!(tracker.pending_count(), 1);
        assert_eq!(quantity_of(&tracker, "L1"), Some(4));
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut tracker = MutationTracker::new(Some(cart(vec![line("L1", 2)])));
        let first = tracker.submit(CartAction::update_quantity("L1", 3));
        let second = tracker.submit(CartAction::update_quantity("L1", 4));

        // Newest answer arrives first, then the stale one.
        assert_eq!(
            tracker.resolve(&second, applied(cart(vec![line("L1", 4)]))),
            Resolution::Applied
        );
        assert_eq!(
            tracker.resolve(&first, applied(cart(vec![line("L1", 3)]))),
            Resolution::Superseded
        );
        assert_eq!(quantity_of(&tracker, "L1"), Some(4));
        assert!(!tracker.projection().is_optimistic);
    }

    #[test]
    fn test_superseded_creation_keeps_new_cart() {
        let mut tracker = MutationTracker::new(None);
        let add = || CartAction::LinesAdd(vec![AddLine::new(CartLineInput::new("V-L1", 1))]);
        let first = tracker.submit(add());
        let second = tracker.submit(add());
        assert_eq!(second.superseded, Some(first.token));

        let resolution = tracker.resolve(&first, applied(cart(vec![line("L1", 1)])));

        assert_eq!(resolution, Resolution::Superseded);
        assert_eq!(
            tracker.cart_id(),
            Some(&CartId::new("gid://shopify/Cart/c1"))
        );
        // The second add is still pending on top of the created cart.
        assert_eq!(tracker.pending_count(), 1);
        assert_eq!(tracker.projection().total_quantity, 2);
    }

    #[test]
    fn test_superseded_answer_ignored_once_cart_exists() {
        let mut tracker = MutationTracker::new(Some(cart(vec![line("L1", 2)])));
        let first = tracker.submit(CartAction::update_quantity("L1", 3));
        tracker.submit(CartAction::update_quantity("L1", 4));
        let version = tracker.version();

        tracker.resolve(&first, applied(cart(vec![line("L1", 3)])));

        assert_eq!(tracker.version(), version);
        assert_eq!(tracker.confirmed().unwrap().lines[0].quantity, 2);
    }

    #[test]
    fn test_rejection_reverts_and_reports() {
        let mut tracker = MutationTracker::new(Some(cart(vec![line("L1", 2)])));
        let ticket = tracker.submit(CartAction::remove_line("L1"));
        assert_eq!(quantity_of(&tracker, "L1"), None);

        let error = CartUserError {
            code: Some("INVALID".to_string()),
            field: vec!["lineIds".to_string()],
            message: "Line not found".to_string(),
        };
        let resolution = tracker.resolve(&ticket, Err(MutationFailure::Rejected(vec![error.clone()])));

        assert_eq!(resolution, Resolution::Rejected);
        assert_eq!(quantity_of(&tracker, "L1"), Some(2));
        let report = tracker.last_report().unwrap();
        assert_eq!(report.status, MutationStatus::Rejected);
        assert_eq!(report.errors, vec![error]);
        assert_eq!(report.kind, CartActionKind::LinesRemove);
    }

    #[test]
    fn test_user_errors_in_payload_reject() {
        let mut tracker = MutationTracker::new(Some(cart(Vec::new())));
        let ticket = tracker.submit(CartAction::discount_codes(["NOPE"]));
        let payload = CartMutationPayload {
            cart: Some(cart(Vec::new())),
            user_errors: vec![CartUserError {
                code: None,
                field: vec!["discountCodes".to_string()],
                message: "Code invalide".to_string(),
            }],
            warnings: Vec::new(),
        };
        assert_eq!(tracker.resolve(&ticket, Ok(payload)), Resolution::Rejected);
        assert!(tracker.projection().discount_codes.is_empty());
    }

    #[test]
    fn test_transport_failure_reverts() {
        let mut tracker = MutationTracker::new(Some(cart(vec![line("L1", 2)])));
        let ticket = tracker.submit(CartAction::update_quantity("L1", 9));
        let resolution = tracker.resolve(&ticket, Err(MutationFailure::Transport("reset".into())));
        assert_eq!(resolution, Resolution::Failed);
        assert_eq!(quantity_of(&tracker, "L1"), Some(2));
        assert!(tracker.last_report().unwrap().errors.is_empty());
    }

    #[test]
    fn test_missing_cart_is_failure() {
        let mut tracker = MutationTracker::new(None);
        let ticket = tracker.submit(CartAction::update_quantity("L1", 1));
        assert_eq!(
            tracker.resolve(&ticket, Ok(CartMutationPayload::default())),
            Resolution::Failed
        );
    }

    #[test]
    fn test_removal_wins_against_late_update_response() {
        let mut tracker = MutationTracker::new(Some(cart(vec![line("L1", 2), line("L2", 1)])));
        let update = tracker.submit(CartAction::update_quantity("L1", 5));
        let remove = tracker.submit(CartAction::remove_line("L1"));
        assert_eq!(quantity_of(&tracker, "L1"), None);

        assert_eq!(
            tracker.resolve(&remove, applied(cart(vec![line("L2", 1)]))),
            Resolution::Applied
        );
        // The update was computed before the removal and still carries L1.
        assert_eq!(
            tracker.resolve(&update, applied(cart(vec![line("L1", 5), line("L2", 1)]))),
            Resolution::Applied
        );

        assert_eq!(quantity_of(&tracker, "L1"), None);
        assert_eq!(tracker.projection().total_quantity, 1);
        assert!(tracker.take_refresh_request());
        assert!(!tracker.take_refresh_request());
    }

    #[test]
    fn test_refresh_guarded_by_version() {
        let mut tracker = MutationTracker::new(Some(cart(vec![line("L1", 2)])));
        let seen = tracker.version();
        let ticket = tracker.submit(CartAction::update_quantity("L1", 3));
        tracker.resolve(&ticket, applied(cart(vec![line("L1", 3)])));

        assert!(!tracker.replace_confirmed(seen, Some(cart(vec![line("L1", 2)]))));
        assert_eq!(quantity_of(&tracker, "L1"), Some(3));

        let seen = tracker.version();
        assert!(tracker.replace_confirmed(seen, Some(cart(vec![line("L1", 7)]))));
        assert_eq!(quantity_of(&tracker, "L1"), Some(7));
    }

    #[test]
    fn test_not_found_maps_to_rejection() {
        let failure = MutationFailure::from(ShopifyError::NotFound("cart".to_string()));
        let MutationFailure::Rejected(errors) = failure else {
            panic!("expected rejection");
        };
        assert_eq!(errors[0].code.as_deref(), Some("NOT_FOUND"));

        let failure = MutationFailure::from(ShopifyError::RateLimited(2));
        assert!(matches!(failure, MutationFailure::Transport(_)));
    }
}
