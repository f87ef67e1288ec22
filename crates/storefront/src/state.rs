//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::CartSessions;
use crate::config::StorefrontConfig;
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the configuration, the Storefront API
/// client and the per-visitor cart sessions.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    carts: CartSessions,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storefront = StorefrontClient::new(&config.shopify);
        let carts = CartSessions::new(config.cart.session_idle);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the per-visitor cart sessions.
    #[must_use]
    pub fn carts(&self) -> &CartSessions {
        &self.inner.carts
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("storefront", &self.inner.storefront)
            .field("carts", &self.inner.carts)
            .finish()
    }
}
