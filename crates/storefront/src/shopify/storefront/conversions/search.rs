//! Search result conversion.

use crate::locale::Locale;
use crate::shopify::ShopifyError;
use crate::shopify::metafields::{MetafieldMap, subtitle_candidates};
use crate::shopify::types::{
    Metafield, NodeId, PageInfo, SearchArticle, SearchConnection, SearchNode, SearchPage,
    SearchProduct,
};

use super::super::queries::search::{SearchResultItem, SearchResults};
use super::cart::{convert_image, convert_money};

/// Convert one page of search results, resolving product subtitles for `locale`.
///
/// # Errors
///
/// Returns an error if a product price cannot be parsed.
pub fn convert_search(results: SearchResults, locale: Locale) -> Result<SearchConnection, ShopifyError> {
    let nodes = results
        .nodes
        .into_iter()
        .map(|item| convert_item(item, locale))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchConnection {
        nodes,
        total_count: u64::try_from(results.total_count).unwrap_or(0),
        page_info: PageInfo {
            has_next_page: results.page_info.has_next_page,
            end_cursor: results.page_info.end_cursor,
        },
    })
}

fn convert_item(item: SearchResultItem, locale: Locale) -> Result<SearchNode, ShopifyError> {
    Ok(match item {
        SearchResultItem::Product(p) => {
            let metafields = MetafieldMap::from_entries(p.metafields.into_iter().map(|m| {
                m.map(|m| Metafield {
                    namespace: m.namespace,
                    key: m.key,
                    value: m.value,
                })
            }));
            SearchNode::Product(SearchProduct {
                id: NodeId::new(p.id),
                handle: p.handle,
                title: p.title,
                vendor: p.vendor,
                price: Some(convert_money(&p.price_range.min_variant_price)?),
                image: p.featured_image.map(convert_image),
                available_for_sale: p.available_for_sale,
                subtitle: metafields
                    .resolve(&subtitle_candidates(locale))
                    .map(str::to_string),
            })
        }
        SearchResultItem::Article(a) => SearchNode::Article(SearchArticle {
            id: NodeId::new(a.id),
            handle: a.handle,
            blog_handle: a.blog.handle,
            title: a.title,
            excerpt: a.excerpt,
        }),
        SearchResultItem::Page(p) => SearchNode::Page(SearchPage {
            id: NodeId::new(p.id),
            handle: p.handle,
            title: p.title,
        }),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn results() -> SearchResults {
        serde_json::from_value(serde_json::json!({
            "totalCount": 1,
            "pageInfo": { "hasNextPage": false, "endCursor": "abc" },
            "nodes": [{
                "__typename": "Product",
                "id": "gid://shopify/Product/P1",
                "handle": "shampoing-lisse",
                "title": "Shampoing Lisse",
                "vendor": "Boucle",
                "availableForSale": true,
                "priceRange": { "minVariantPrice": { "amount": "14.5", "currencyCode": "EUR" } },
                "featuredImage": null,
                "metafields": [
                    null,
                    { "namespace": "custom", "key": "subtitle_en", "value": "Smoothing shampoo" },
                    { "namespace": "custom", "key": "subtitle", "value": "Shampoing lissant" },
                    null
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_subtitle_follows_locale() {
        let en = convert_search(results(), Locale::En).unwrap();
        let SearchNode::Product(product) = &en.nodes[0] else {
            panic!("expected product");
        };
        assert_eq!(product.subtitle.as_deref(), Some("Smoothing shampoo"));

        let fr = convert_search(results(), Locale::Fr).unwrap();
        let SearchNode::Product(product) = &fr.nodes[0] else {
            panic!("expected product");
        };
        assert_eq!(product.subtitle.as_deref(), Some("Shampoing lissant"));
        assert_eq!(fr.total_count, 1);
        assert_eq!(fr.page_info.end_cursor.as_deref(), Some("abc"));
    }
}
