//! Per-visitor cart sessions.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use super::session::CartSession;

/// Upper bound on concurrently tracked visitors.
const MAX_SESSIONS: u64 = 50_000;

/// Cart sessions keyed by visitor ID, evicted after an idle period.
///
/// An evicted session loses only its pending state; the cart ID lives in the
/// visitor's HTTP session and the cart is re-fetched on the next request.
#[derive(Clone)]
pub struct CartSessions {
    sessions: Cache<String, Arc<CartSession>>,
}

impl CartSessions {
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Session for a visitor, created empty on first use.
    pub async fn get_or_create(&self, visitor: &str) -> Arc<CartSession> {
        self.sessions
            .get_with(visitor.to_string(), async { Arc::new(CartSession::default()) })
            .await
    }

    pub async fn get(&self, visitor: &str) -> Option<Arc<CartSession>> {
        self.sessions.get(visitor).await
    }

    pub async fn remove(&self, visitor: &str) {
        self.sessions.invalidate(visitor).await;
    }
}

impl std::fmt::Debug for CartSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSessions")
            .field("entries", &self.sessions.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_visitor_same_session() {
        let sessions = CartSessions::new(Duration::from_secs(60));
        let a = sessions.get_or_create("visitor-1").await;
        let b = sessions.get_or_create("visitor-1").await;
        let c = sessions.get_or_create("visitor-2").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn test_remove() {
        let sessions = CartSessions::new(Duration::from_secs(60));
        sessions.get_or_create("visitor-1").await;
        sessions.remove("visitor-1").await;
        assert!(sessions.get("visitor-1").await.is_none());
    }
}
