//! Session middleware configuration.
//!
//! Sessions live in the tower-sessions in-memory store. They hold only small
//! visitor state: the visitor ID, the Shopify cart ID and the chosen locale.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "boucle_session";

/// Session expiry time in seconds (14 days).
const SESSION_EXPIRY_SECONDS: i64 = 14 * 24 * 60 * 60;

/// Keys for values stored in the session.
pub mod keys {
    /// Random per-visitor ID keying the in-process cart session.
    pub const VISITOR_ID: &str = "visitor_id";

    /// Shopify cart ID, kept so a cart survives cart session eviction.
    pub const CART_ID: &str = "cart_id";

    /// Display language picked through `POST /locale`.
    pub const LOCALE: &str = "locale";
}

/// Create the session layer with the in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    let is_secure = config.base_url.scheme() == "https";

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
