//! Per-request locale resolution.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::ACCEPT_LANGUAGE, request::Parts},
};
use tower_sessions::Session;

use super::session::keys;
use crate::locale::Locale;
use crate::state::AppState;

/// Locale for the current request.
///
/// Resolved from the session (an explicit choice), then the `Accept-Language`
/// header, then the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentLocale(pub Locale);

impl FromRequestParts<AppState> for CurrentLocale {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let chosen = match parts.extensions.get::<Session>() {
            Some(session) => session.get::<Locale>(keys::LOCALE).await.ok().flatten(),
            None => None,
        };

        let locale = chosen
            .or_else(|| {
                parts
                    .headers
                    .get(ACCEPT_LANGUAGE)
                    .and_then(|h| h.to_str().ok())
                    .and_then(Locale::from_accept_language)
            })
            .unwrap_or(state.config().default_locale);

        Ok(Self(locale))
    }
}

/// Store an explicit locale choice in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_locale(
    session: &Session,
    locale: Locale,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::LOCALE, locale).await
}
