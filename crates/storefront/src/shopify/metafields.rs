//! Typed metafield lookup.
//!
//! Shopify returns metafields as a list of `(namespace, key, value)` entries,
//! with `null` holes for identifiers that are not set. The map is built once
//! per response and fallbacks are an ordered list of candidate keys.

use std::collections::HashMap;

use crate::locale::Locale;
use crate::shopify::types::Metafield;

/// A `namespace.key` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetafieldKey {
    pub namespace: &'static str,
    pub key: &'static str,
}

impl MetafieldKey {
    #[must_use]
    pub const fn new(namespace: &'static str, key: &'static str) -> Self {
        Self { namespace, key }
    }
}

/// Product subtitle, French copy.
pub const SUBTITLE_FR: MetafieldKey = MetafieldKey::new("custom", "subtitle_fr");
/// Product subtitle, English copy.
pub const SUBTITLE_EN: MetafieldKey = MetafieldKey::new("custom", "subtitle_en");
/// Locale-neutral subtitle.
pub const SUBTITLE: MetafieldKey = MetafieldKey::new("custom", "subtitle");
/// Hair type the product targets (`bouclé`, `lisse`, ...).
pub const HAIR_TYPE: MetafieldKey = MetafieldKey::new("custom", "hair_type");

/// Every identifier requested from the Storefront API.
pub const REQUESTED: [MetafieldKey; 4] = [SUBTITLE_FR, SUBTITLE_EN, SUBTITLE, HAIR_TYPE];

/// Candidate keys for a product subtitle, most specific first.
#[must_use]
pub const fn subtitle_candidates(locale: Locale) -> [MetafieldKey; 3] {
    match locale {
        Locale::Fr => [SUBTITLE_FR, SUBTITLE, SUBTITLE_EN],
        Locale::En => [SUBTITLE_EN, SUBTITLE, SUBTITLE_FR],
    }
}

/// Metafields of one resource, indexed by `(namespace, key)`.
#[derive(Debug, Clone, Default)]
pub struct MetafieldMap {
    values: HashMap<(String, String), String>,
}

impl MetafieldMap {
    /// Build the map, skipping unset identifiers and blank values.
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Option<Metafield>>,
    {
        let values = entries
            .into_iter()
            .flatten()
            .filter(|m| !m.value.trim().is_empty())
            .map(|m| ((m.namespace, m.key), m.value))
            .collect();
        Self { values }
    }

    #[must_use]
    pub fn get(&self, key: MetafieldKey) -> Option<&str> {
        self.values
            .get(&(key.namespace.to_string(), key.key.to_string()))
            .map(String::as_str)
    }

    /// First candidate that has a value.
    #[must_use]
    pub fn resolve(&self, candidates: &[MetafieldKey]) -> Option<&str> {
        candidates.iter().find_map(|key| self.get(*key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
