//! Display language.
//!
//! The storefront is bilingual. The locale is resolved once per request (see
//! [`crate::middleware::CurrentLocale`]) and passed explicitly to search and
//! templates; nothing reads it from ambient state. Templates take their fixed
//! strings from [`Labels`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

/// Error for an unsupported language tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale: {0}")]
pub struct UnsupportedLocale(pub String);

impl Locale {
    pub const ALL: [Self; 2] = [Self::Fr, Self::En];

    /// Lower-case BCP 47 primary tag (`fr`, `en`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::En => "en",
        }
    }

    /// `LanguageCode` enum value for the Storefront API `@inContext` directive.
    #[must_use]
    pub const fn language_code(self) -> &'static str {
        match self {
            Self::Fr => "FR",
            Self::En => "EN",
        }
    }

    /// Fixed interface strings for this language.
    #[must_use]
    pub const fn labels(self) -> &'static Labels {
        match self {
            Self::Fr => &FR_LABELS,
            Self::En => &EN_LABELS,
        }
    }

    /// The language a language switcher offers.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Fr => Self::En,
            Self::En => Self::Fr,
        }
    }

    /// Pick the best supported language from an `Accept-Language` header.
    ///
    /// Entries are ranked by their `q` weight; ties keep header order.
    #[must_use]
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let mut ranked: Vec<(f32, usize, Self)> = header
            .split(',')
            .enumerate()
            .filter_map(|(position, entry)| {
                let mut parts = entry.trim().split(';');
                let tag = parts.next()?.trim();
                let primary = tag.split('-').next()?;
                let locale = primary.parse::<Self>().ok()?;
                let weight = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                (weight > 0.0).then_some((weight, position, locale))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.first().map(|(_, _, locale)| *locale)
    }
}

/// Interface strings rendered by templates.
#[derive(Debug, PartialEq, Eq)]
pub struct Labels {
    pub cart_title: &'static str,
    pub cart_empty: &'static str,
    pub subtotal: &'static str,
    pub total: &'static str,
    pub estimated: &'static str,
    pub updating: &'static str,
    pub remove: &'static str,
    pub decrease: &'static str,
    pub increase: &'static str,
    pub checkout: &'static str,
    pub discount_codes: &'static str,
    pub gift_cards: &'static str,
    pub apply: &'static str,
    pub not_applicable: &'static str,
    pub contact: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub country: &'static str,
    pub save: &'static str,
    pub search_title: &'static str,
    pub search_placeholder: &'static str,
    pub search_submit: &'static str,
    pub search_empty: &'static str,
    pub search_also: &'static str,
    pub switch_language: &'static str,
}

const FR_LABELS: Labels = Labels {
    cart_title: "Votre panier",
    cart_empty: "Votre panier est vide.",
    subtotal: "Sous-total",
    total: "Total",
    estimated: "estimation",
    updating: "Mise à jour…",
    remove: "Retirer",
    decrease: "Diminuer la quantité",
    increase: "Augmenter la quantité",
    checkout: "Paiement",
    discount_codes: "Codes promo",
    gift_cards: "Cartes cadeaux",
    apply: "Appliquer",
    not_applicable: "non applicable",
    contact: "Coordonnées",
    email: "E-mail",
    phone: "Téléphone",
    country: "Pays",
    save: "Enregistrer",
    search_title: "Recherche",
    search_placeholder: "Rechercher un produit…",
    search_submit: "Rechercher",
    search_empty: "Aucun résultat.",
    search_also: "Recherche élargie à",
    switch_language: "English",
};

const EN_LABELS: Labels = Labels {
    cart_title: "Your cart",
    cart_empty: "Your cart is empty.",
    subtotal: "Subtotal",
    total: "Total",
    estimated: "estimate",
    updating: "Updating…",
    remove: "Remove",
    decrease: "Decrease quantity",
    increase: "Increase quantity",
    checkout: "Checkout",
    discount_codes: "Discount codes",
    gift_cards: "Gift cards",
    apply: "Apply",
    not_applicable: "not applicable",
    contact: "Contact details",
    email: "Email",
    phone: "Phone",
    country: "Country",
    save: "Save",
    search_title: "Search",
    search_placeholder: "Search products…",
    search_submit: "Search",
    search_empty: "No results.",
    search_also: "Also searched for",
    switch_language: "Français",
};

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fr" => Ok(Self::Fr),
            "en" => Ok(Self::En),
            other => Err(UnsupportedLocale(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("FR".parse::<Locale>(), Ok(Locale::Fr));
        assert_eq!(" en ".parse::<Locale>(), Ok(Locale::En));
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn test_accept_language_prefers_weight() {
        assert_eq!(
            Locale::from_accept_language("de-DE, fr;q=0.5, en-GB;q=0.8"),
            Some(Locale::En)
        );
        assert_eq!(
            Locale::from_accept_language("fr-CA,en;q=0.9"),
            Some(Locale::Fr)
        );
    }

    #[test]
    fn test_labels_follow_locale() {
        assert_eq!(Locale::Fr.labels().cart_title, "Votre panier");
        assert_eq!(Locale::En.labels().cart_title, "Your cart");
        assert_eq!(Locale::Fr.other(), Locale::En);
    }

    #[test]
    fn test_accept_language_unsupported() {
        assert_eq!(Locale::from_accept_language("de, it;q=0.4"), None);
        assert_eq!(Locale::from_accept_language("en;q=0"), None);
        assert_eq!(Locale::from_accept_language(""), None);
    }
}
