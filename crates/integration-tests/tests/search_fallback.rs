//! Integration tests for bilingual search expansion and fallback.

#![allow(clippy::unwrap_used)]

use boucle_integration_tests::ScriptedCatalog;
use boucle_storefront::config::SearchConfig;
use boucle_storefront::locale::Locale;
use boucle_storefront::search::{SearchOutcome, SearchStage, expand_terms, search_with_fallback};
use boucle_storefront::shopify::types::SearchNode;

const LISSE_COMBINED: &str = "lisse OR smooth OR straight OR sleek";

fn titles(outcome: &SearchOutcome) -> Vec<&str> {
    outcome.nodes.iter().map(SearchNode::title).collect()
}

// =============================================================================
// Expansion
// =============================================================================

#[test]
fn test_expand_lisse() {
    let expanded = expand_terms("lisse");
    assert_eq!(expanded.terms, vec!["lisse", "smooth", "straight", "sleek"]);
    assert_eq!(expanded.combined(), LISSE_COMBINED);
}

#[test]
fn test_expand_boucle() {
    let expanded = expand_terms("bouclé");
    assert_eq!(expanded.terms[0], "bouclé");
    for term in ["curly", "curls", "wavy"] {
        assert!(expanded.terms.iter().any(|t| t == term), "missing {term}");
    }
    assert!(expanded.has_synonyms());
}

#[test]
fn test_expand_ignores_accents_and_case() {
    let typed = expand_terms("BOUCLE");
    assert_eq!(typed.terms[0], "boucle");
    assert!(typed.terms.iter().any(|t| t == "curly"));
    // "bouclé" folds onto the typed token and is not repeated.
    assert!(!typed.terms.iter().any(|t| t == "bouclé"));
}

#[test]
fn test_expand_from_english() {
    let expanded = expand_terms("smooth");
    assert!(expanded.terms.iter().any(|t| t == "lisse"));
}

// =============================================================================
// Fallback
// =============================================================================

#[tokio::test]
async fn test_combined_query_enough() {
    let catalog = ScriptedCatalog::new().answer(LISSE_COMBINED, &["a", "b", "c", "d"]);
    let outcome = search_with_fallback(&catalog, "lisse", Locale::Fr, &SearchConfig::default())
        .await
        .unwrap();

    assert_eq!(outcome.len(), 4);
    assert_eq!(catalog.queries(), vec![LISSE_COMBINED]);
    assert_eq!(
        outcome.stages,
        vec![SearchStage::Combined(LISSE_COMBINED.to_string())]
    );
}

#[tokio::test]
async fn test_fallback_stops_at_min_results() {
    let catalog = ScriptedCatalog::new()
        .answer(LISSE_COMBINED, &["serum-lissant"])
        .answer("lisse", &["serum-lissant", "shampoing-lisse"])
        .answer("smooth", &["brume-lissante", "masque-lissant"])
        .answer("straight", &["never-reached"]);

    let outcome = search_with_fallback(&catalog, "lisse", Locale::Fr, &SearchConfig::default())
        .await
        .unwrap();

    assert_eq!(catalog.queries(), vec![LISSE_COMBINED, "lisse", "smooth"]);
    assert_eq!(outcome.len(), 4);
    assert_eq!(
        titles(&outcome),
        vec!["serum lissant", "shampoing lisse", "brume lissante", "masque lissant"]
    );
    assert_eq!(outcome.stages[1], SearchStage::Original("lisse".to_string()));
    assert_eq!(outcome.stages[2], SearchStage::Term("smooth".to_string()));
}

#[tokio::test]
async fn test_fallback_limits_terms() {
    let catalog = ScriptedCatalog::new();
    let config = SearchConfig {
        max_fallback_terms: 2,
        ..SearchConfig::default()
    };

    let outcome = search_with_fallback(&catalog, "lisse", Locale::En, &config)
        .await
        .unwrap();

    assert!(outcome.is_empty());
    assert_eq!(
        catalog.queries(),
        vec![LISSE_COMBINED, "lisse", "smooth", "straight"]
    );
}

#[tokio::test]
async fn test_no_synonyms_sends_one_query() {
    let catalog = ScriptedCatalog::new();
    let outcome = search_with_fallback(&catalog, "bergamote", Locale::Fr, &SearchConfig::default())
        .await
        .unwrap();

    assert!(outcome.is_empty());
    assert_eq!(catalog.queries(), vec!["bergamote"]);
}

#[tokio::test]
async fn test_case_only_difference_sends_one_query() {
    let catalog = ScriptedCatalog::new();
    search_with_fallback(&catalog, "  BERGAMOTE ", Locale::En, &SearchConfig::default())
        .await
        .unwrap();

    assert_eq!(catalog.queries(), vec!["bergamote"]);
}

#[tokio::test]
async fn test_empty_query_sends_nothing() {
    let catalog = ScriptedCatalog::new();
    let outcome = search_with_fallback(&catalog, "   ", Locale::Fr, &SearchConfig::default())
        .await
        .unwrap();

    assert!(outcome.is_empty());
    assert!(catalog.queries().is_empty());
}

#[tokio::test]
async fn test_combined_failure_is_an_error() {
    let catalog = ScriptedCatalog::new().fail(LISSE_COMBINED);
    let result =
        search_with_fallback(&catalog, "lisse", Locale::Fr, &SearchConfig::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_fallback_failure_is_skipped() {
    let catalog = ScriptedCatalog::new()
        .fail("lisse")
        .answer("smooth", &["brume-lissante"]);

    let outcome = search_with_fallback(&catalog, "lisse", Locale::Fr, &SearchConfig::default())
        .await
        .unwrap();

    assert_eq!(outcome.len(), 1);
    assert_eq!(
        catalog.queries(),
        vec![LISSE_COMBINED, "lisse", "smooth", "straight", "sleek"]
    );
    assert!(!outcome.stages.contains(&SearchStage::Original("lisse".to_string())));
}
