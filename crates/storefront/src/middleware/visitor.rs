//! Visitor extractor.
//!
//! Every visitor gets a random ID on first contact. The ID keys the visitor's
//! in-process [`CartSession`](crate::cart::CartSession); the Shopify cart ID
//! is stored next to it so the cart can be re-read after the cart session is
//! evicted.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use super::session::keys;
use crate::error::AppError;
use crate::shopify::types::CartId;

/// The current visitor and their HTTP session.
#[derive(Debug, Clone)]
pub struct Visitor {
    id: String,
    session: Session,
}

impl Visitor {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Cart ID remembered in the session.
    pub async fn cart_id(&self) -> Option<CartId> {
        self.session
            .get::<CartId>(keys::CART_ID)
            .await
            .ok()
            .flatten()
    }

    /// Remember the cart ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set_cart_id(&self, cart_id: &CartId) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::CART_ID, cart_id).await
    }

    /// Forget the cart ID (cart expired or completed).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear_cart_id(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.remove::<CartId>(keys::CART_ID).await.map(|_| ())
    }
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let id = match session.get::<String>(keys::VISITOR_ID).await? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                session.insert(keys::VISITOR_ID, &id).await?;
                tracing::debug!(visitor = %id, "new visitor");
                id
            }
        };

        Ok(Self { id, session })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use tower_sessions::MemoryStore;

    use super::*;

    fn parts_with_session(session: Session) -> Parts {
        let (mut parts, ()) = Request::builder().uri("/cart").body(()).unwrap().into_parts();
        parts.extensions.insert(session);
        parts
    }

    #[tokio::test]
    async fn test_visitor_id_is_stable() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let mut parts = parts_with_session(session.clone());
        let first = Visitor::from_request_parts(&mut parts, &()).await.unwrap();
        let mut parts = parts_with_session(session);
        let second = Visitor::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(first.id(), second.id());
        assert!(Uuid::parse_str(first.id()).is_ok());
    }

    #[tokio::test]
    async fn test_cart_id_round_trip() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut parts = parts_with_session(session);
        let visitor = Visitor::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(visitor.cart_id().await, None);
        let cart_id = CartId::new("gid://shopify/Cart/c1");
        visitor.set_cart_id(&cart_id).await.unwrap();
        assert_eq!(visitor.cart_id().await, Some(cart_id));
        visitor.clear_cart_id().await.unwrap();
        assert_eq!(visitor.cart_id().await, None);
    }

    #[tokio::test]
    async fn test_missing_session_layer() {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        let err = Visitor::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
