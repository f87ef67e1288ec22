//! Catalog search with bilingual query expansion.
//!
//! Shopify does the matching and ranking. This module only rewrites the
//! query: every token is expanded through the synonym table and the terms are
//! sent as one `OR` query. When that returns too little, it falls back to:
//!
//! 1. the bare original query,
//! 2. then up to `max_fallback_terms` expanded terms, one query each,
//!
//! merging unique results by node ID and stopping as soon as there are
//! `min_results` of them.

mod synonyms;

use std::collections::HashSet;
use std::future::Future;

use serde::Serialize;
use tracing::instrument;

use crate::config::SearchConfig;
use crate::locale::Locale;
use crate::shopify::ShopifyError;
use crate::shopify::types::{NodeId, SearchConnection, SearchNode};

pub use synonyms::fold;

/// Catalog search as consumed by the fallback strategy.
pub trait SearchBackend: Send + Sync {
    fn search(
        &self,
        query: &str,
        first: u16,
        locale: Locale,
    ) -> impl Future<Output = Result<SearchConnection, ShopifyError>> + Send;
}

/// A query with its expanded term set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedQuery {
    /// Query as typed, trimmed.
    pub original: String,
    /// Original tokens first, then synonyms; no duplicates.
    pub terms: Vec<String>,
    /// How many of `terms` are original tokens.
    original_count: usize,
}

impl ExpandedQuery {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms added by the synonym table.
    pub fn synonyms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().skip(self.original_count).map(String::as_str)
    }

    #[must_use]
    pub fn has_synonyms(&self) -> bool {
        self.terms.len() > self.original_count
    }

    /// All terms as one Shopify search query.
    #[must_use]
    pub fn combined(&self) -> String {
        self.terms.join(" OR ")
    }
}

/// Expand a free-text query through the synonym table.
///
/// Tokens are split on whitespace and lower-cased; surrounding punctuation and
/// double quotes are dropped. Terms are de-duplicated ignoring accents.
#[must_use]
pub fn expand_terms(query: &str) -> ExpandedQuery {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| c.is_ascii_punctuation() && c != '-')
                .replace('"', "")
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect();

    for token in &tokens {
        if seen.insert(fold(token)) {
            terms.push(token.clone());
        }
    }
    let original_count = terms.len();

    for token in &tokens {
        for synonym in synonyms::lookup(token) {
            if seen.insert(fold(synonym)) {
                terms.push(synonym.to_string());
            }
        }
    }

    ExpandedQuery {
        original: query.trim().to_string(),
        terms,
        original_count,
    }
}

/// Which query produced results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "query", rename_all = "snake_case")]
pub enum SearchStage {
    Combined(String),
    Original(String),
    Term(String),
}

impl SearchStage {
    #[must_use]
    pub fn query(&self) -> &str {
        match self {
            Self::Combined(q) | Self::Original(q) | Self::Term(q) => q,
        }
    }
}

/// Merged results of one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub terms: Vec<String>,
    pub nodes: Vec<SearchNode>,
    /// Queries sent, in order.
    pub stages: Vec<SearchStage>,
}

impl SearchOutcome {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct Merger {
    seen: HashSet<NodeId>,
    outcome: SearchOutcome,
}

impl Merger {
    fn add(&mut self, stage: SearchStage, results: SearchConnection) {
        self.outcome.stages.push(stage);
        for node in results.nodes {
            if self.seen.insert(node.id().clone()) {
                self.outcome.nodes.push(node);
            }
        }
    }
}

/// Search with expansion and the two-stage fallback.
///
/// # Errors
///
/// Returns an error only if the first, combined query fails. Fallback
/// failures are logged and the results gathered so far are returned.
#[instrument(skip(backend, config), fields(locale = %locale))]
pub async fn search_with_fallback<B: SearchBackend>(
    backend: &B,
    query: &str,
    locale: Locale,
    config: &SearchConfig,
) -> Result<SearchOutcome, ShopifyError> {
    let expanded = expand_terms(query);
    let mut merger = Merger {
        seen: HashSet::new(),
        outcome: SearchOutcome {
            query: expanded.original.clone(),
            terms: expanded.terms.clone(),
            ..SearchOutcome::default()
        },
    };
    if expanded.is_empty() {
        return Ok(merger.outcome);
    }

    let combined = expanded.combined();
    let results = backend.search(&combined, config.page_size, locale).await?;
    merger.add(SearchStage::Combined(combined.clone()), results);

    let mut fallbacks: Vec<SearchStage> = Vec::new();
    if fold(&expanded.original) != fold(&combined) {
        fallbacks.push(SearchStage::Original(expanded.original.clone()));
    }
    fallbacks.extend(
        expanded
            .synonyms()
            .take(config.max_fallback_terms)
            .map(|term| SearchStage::Term(term.to_string())),
    );

    for stage in fallbacks {
        if merger.outcome.len() >= config.min_results {
            break;
        }
        let query = stage.query().to_string();
        match backend.search(&query, config.page_size, locale).await {
            Ok(results) => merger.add(stage, results),
            Err(e) => tracing::warn!(query = %query, "Search fallback failed: {e}"),
        }
    }

    tracing::debug!(
        results = merger.outcome.len(),
        queries = merger.outcome.stages.len(),
        "search complete"
    );
    Ok(merger.outcome)
}
