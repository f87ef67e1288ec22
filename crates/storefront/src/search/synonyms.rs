//! Bilingual (FR/EN) hair-care synonym table.
//!
//! Each group lists terms that mean the same thing to a shopper. A query token
//! matching any member of a group pulls in the whole group. Matching ignores
//! case and French accents, so `boucle` finds the `bouclé` group.

/// Synonym groups. A term may appear in more than one group.
const GROUPS: &[&[&str]] = &[
    // Hair textures
    &["lisse", "smooth", "straight", "sleek"],
    &["bouclé", "curly", "curls", "wavy"],
    &["boucles", "curls", "curly"],
    &["ondulé", "wavy", "waves"],
    &["frisé", "frizzy", "curly"],
    &["crépu", "coily", "kinky", "afro"],
    &["frisottis", "frizz", "anti-frizz"],
    // Hair condition
    &["sec", "secs", "dry"],
    &["gras", "oily", "greasy"],
    &["fins", "fine", "thin"],
    &["épais", "thick"],
    &["abîmés", "damaged"],
    &["colorés", "coloured", "colored", "dyed"],
    // Products
    &["shampoing", "shampooing", "shampoo"],
    &["après-shampoing", "conditioner"],
    &["masque", "mask"],
    &["huile", "oil"],
    &["sérum", "serum"],
    &["crème", "cream"],
    &["brume", "mist", "spray"],
    &["démêlant", "detangler", "detangling"],
    &["coiffant", "styling"],
    &["brosse", "brush"],
    &["peigne", "comb"],
    &["bonnet", "cap"],
    &["taie", "pillowcase"],
    &["coffret", "kit", "set", "bundle"],
    // Effects
    &["hydratant", "hydratation", "moisturizing", "moisturising", "hydrating", "moisture"],
    &["nourrissant", "nourishing"],
    &["réparateur", "repair", "repairing"],
    &["brillance", "shine", "gloss"],
    &["volume", "volumizing", "volumising"],
    &["définition", "definition", "defining"],
    // General
    &["cheveux", "hair"],
    &["soin", "care", "treatment"],
];

/// Lower-case `term` and strip French diacritics.
#[must_use]
pub fn fold(term: &str) -> String {
    term.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ÿ' => 'y',
            other => other,
        })
        .collect()
}

/// Every term of every group containing `token`, in table order.
pub fn lookup(token: &str) -> impl Iterator<Item = &'static str> {
    let folded = fold(token);
    GROUPS
        .iter()
        .filter(move |group| group.iter().any(|term| fold(term) == folded))
        .flat_map(|group| group.iter().copied())
}
