//! Language switch.

use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode, header::REFERER},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::Url;

use crate::error::{AppError, Result};
use crate::locale::Locale;
use crate::middleware::set_locale;
use crate::state::AppState;

/// HTMX event emitted after the display language changes.
pub const LOCALE_CHANGED_TRIGGER: &str = "locale-changed";

/// Language switch form data.
#[derive(Debug, Deserialize)]
pub struct LocaleForm {
    pub locale: String,
}

/// Store the chosen language (`POST /locale`).
///
/// HTMX requests get `204` with an `HX-Trigger: locale-changed` header so the
/// page can re-render; plain form posts are redirected back when the
/// `Referer` points at this storefront.
#[instrument(skip(state, session, headers))]
pub async fn switch(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<LocaleForm>,
) -> Result<Response> {
    let locale: Locale = form
        .locale
        .parse()
        .map_err(|e: crate::locale::UnsupportedLocale| AppError::BadRequest(e.to_string()))?;
    set_locale(&session, locale).await?;
    tracing::debug!(%locale, "locale changed");

    if headers.contains_key("hx-request") {
        return Ok((
            StatusCode::NO_CONTENT,
            AppendHeaders([("HX-Trigger", LOCALE_CHANGED_TRIGGER)]),
        )
            .into_response());
    }

    let back = headers
        .get(REFERER)
        .and_then(|h| h.to_str().ok())
        .and_then(|referer| local_path(&state.config().base_url, referer))
        .unwrap_or_else(|| "/cart".to_string());
    Ok(Redirect::to(&back).into_response())
}

/// Path and query of `referer` if it resolves to the storefront's own origin.
fn local_path(base: &Url, referer: &str) -> Option<String> {
    let target = base.join(referer).ok()?;
    if target.origin() != base.origin() || target.path().starts_with("//") {
        return None;
    }
    Some(match target.query() {
        Some(query) => format!("{}?{query}", target.path()),
        None => target.path().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_local_path() {
        let base = Url::parse("https://boucle.shop").unwrap();
        let path = |referer: &str| local_path(&base, referer);

        assert_eq!(path("https://boucle.shop/search?q=lisse").as_deref(), Some("/search?q=lisse"));
        assert_eq!(path("/cart").as_deref(), Some("/cart"));
        assert_eq!(path("https://boucle.shop").as_deref(), Some("/"));
        assert_eq!(path("https://evil.example/cart"), None);
        assert_eq!(path("//evil.example/x"), None);
        assert_eq!(path("/\\evil.example"), None);
        assert_eq!(path("https://boucle.shop//evil.example/x"), None);
        assert_eq!(path("http://boucle.shop/cart"), None);
    }
}
