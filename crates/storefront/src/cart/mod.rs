//! Optimistic cart engine.
//!
//! # Architecture
//!
//! - [`CartAction`] describes one cart mutation; [`CartAction::key`] derives its
//!   coalescing key (`LinesUpdate-<line id>`).
//! - [`MutationTracker`] holds the last confirmed cart and the pending
//!   mutations, one per key. A newer submission with the same key supersedes
//!   the older one; responses whose request token no longer matches are
//!   discarded.
//! - [`project`] rebuilds the displayed cart from `(confirmed, pending)` on
//!   every change. Nothing is patched in place.
//! - [`CartSession`] wraps a tracker for concurrent use, talks to a
//!   [`CartBackend`], and publishes every projection on a `watch` channel.
//!
//! Removal wins: a pending `LinesRemove` hides its lines even if a later
//! `LinesUpdate` for the same line is in flight under a different key.

mod action;
mod key;
mod projection;
mod registry;
mod session;
mod tracker;

pub use action::{AddLine, CartAction, CartActionKind, InvalidAction};
pub use key::{CoalescingKey, KEY_SEPARATOR, coalescing_key};
pub use projection::{CartProjection, OPTIMISTIC_LINE_PREFIX, ProjectedCost, project};
pub use registry::CartSessions;
pub use session::{CartBackend, CartSession, CartSnapshot, DispatchOutcome};
pub use tracker::{
    MutationFailure, MutationReport, MutationStatus, MutationTracker, RequestToken, Resolution,
    Ticket,
};
