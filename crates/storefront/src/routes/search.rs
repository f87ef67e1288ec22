//! Search route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::locale::{Labels, Locale};
use crate::middleware::CurrentLocale;
use crate::search::{SearchOutcome, search_with_fallback};
use crate::shopify::types::SearchNode;
use crate::state::AppState;

/// Search page query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// One search hit, flattened for templates.
#[derive(Debug, Clone)]
pub struct ResultView {
    pub title: String,
    pub path: String,
    pub kind: &'static str,
    pub subtitle: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
}

impl From<&SearchNode> for ResultView {
    fn from(node: &SearchNode) -> Self {
        let (kind, subtitle, price, image_url) = match node {
            SearchNode::Product(p) => (
                "product",
                p.subtitle.clone(),
                p.price.map(|m| m.to_string()),
                p.image.as_ref().map(|i| i.url.clone()),
            ),
            SearchNode::Article(a) => ("article", a.excerpt.clone(), None, None),
            SearchNode::Page(_) => ("page", None, None, None),
        };
        Self {
            title: node.title().to_string(),
            path: node.path(),
            kind,
            subtitle,
            price,
            image_url,
        }
    }
}

/// Search results with the synonyms that widened the query.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<ResultView>,
    pub synonyms: Vec<String>,
}

impl From<&SearchOutcome> for SearchView {
    fn from(outcome: &SearchOutcome) -> Self {
        let typed: Vec<String> = outcome
            .query
            .split_whitespace()
            .map(crate::search::fold)
            .collect();
        Self {
            query: outcome.query.clone(),
            results: outcome.nodes.iter().map(ResultView::from).collect(),
            synonyms: outcome
                .terms
                .iter()
                .filter(|t| !typed.contains(&crate::search::fold(t)))
                .cloned()
                .collect(),
        }
    }
}

/// Full search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search/show.html")]
pub struct SearchPageTemplate {
    pub search: SearchView,
    pub locale: Locale,
    pub labels: &'static Labels,
}

/// Search results fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_results.html")]
pub struct SearchResultsTemplate {
    pub search: SearchView,
    pub labels: &'static Labels,
}

/// Search the catalog (`GET /search?q=`).
///
/// HTMX requests get the results fragment; others get the full page.
#[instrument(skip(state, headers))]
pub async fn search_page(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let outcome =
        search_with_fallback(state.storefront(), &query.q, locale, &state.config().search).await?;
    let search = SearchView::from(&outcome);
    let labels = locale.labels();

    if headers.contains_key("hx-request") {
        return Ok(SearchResultsTemplate { search, labels }.into_response());
    }

    Ok(SearchPageTemplate {
        search,
        locale,
        labels,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::types::{CurrencyCode, Money, NodeId, SearchPage, SearchProduct};

    #[test]
    fn test_search_view() {
        let outcome = SearchOutcome {
            query: "Lisse".to_string(),
            terms: vec![
                "lisse".to_string(),
                "smooth".to_string(),
                "straight".to_string(),
            ],
            nodes: vec![
                SearchNode::Product(SearchProduct {
                    id: NodeId::new("gid://shopify/Product/P1"),
                    handle: "shampoing-lisse".to_string(),
                    title: "Shampoing Lisse".to_string(),
                    vendor: "Boucle".to_string(),
                    price: Some(Money::from_cents(1450, CurrencyCode::EUR)),
                    image: None,
                    available_for_sale: true,
                    subtitle: Some("Shampoing lissant".to_string()),
                }),
                SearchNode::Page(SearchPage {
                    id: NodeId::new("gid://shopify/Page/1"),
                    handle: "conseils".to_string(),
                    title: "Conseils".to_string(),
                }),
            ],
            stages: Vec::new(),
        };

        let view = SearchView::from(&outcome);
        assert_eq!(view.synonyms, vec!["smooth".to_string(), "straight".to_string()]);
        assert_eq!(view.results.len(), 2);
        assert_eq!(view.results[0].path, "/products/shampoing-lisse");
        assert_eq!(view.results[0].price.as_deref(), Some("€14.50"));
        assert_eq!(view.results[1].kind, "page");
        assert_eq!(view.results[1].path, "/pages/conseils");
    }
}
