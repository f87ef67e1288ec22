//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with the in-memory store)
//!
//! The [`Visitor`] and [`CurrentLocale`] extractors read from the session.

pub mod locale;
pub mod session;
pub mod visitor;

pub use locale::{CurrentLocale, set_locale};
pub use session::create_session_layer;
pub use visitor::Visitor;
