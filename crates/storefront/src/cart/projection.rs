//! Displayed cart: the confirmed cart with pending mutations applied.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::action::{AddLine, CartAction};
use super::tracker::RequestToken;
use crate::shopify::types::{
    AppliedGiftCard, Cart, CartBuyerIdentity, CartDiscountCode, CartId, CartLine, CartLineCost,
    CartMerchandise, LineId, Money,
};

/// Prefix of line IDs invented for lines Shopify has not created yet.
pub const OPTIMISTIC_LINE_PREFIX: &str = "optimistic:";

/// Cost summary as displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedCost {
    pub subtotal: Money,
    pub total: Money,
    pub total_tax: Option<Money>,
    /// Recomputed locally from line prices rather than confirmed by Shopify.
    pub estimated: bool,
}

/// Cart-shaped projection handed to templates and subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProjection {
    /// `None` until Shopify has created the cart.
    pub id: Option<CartId>,
    pub checkout_url: Option<String>,
    pub lines: Vec<CartLine>,
    pub total_quantity: u32,
    pub cost: Option<ProjectedCost>,
    pub discount_codes: Vec<CartDiscountCode>,
    pub applied_gift_cards: Vec<AppliedGiftCard>,
    pub buyer_identity: Option<CartBuyerIdentity>,
    /// True while any mutation is pending.
    pub is_optimistic: bool,
}

impl CartProjection {
    /// Projection of a confirmed cart with nothing pending.
    #[must_use]
    pub fn confirmed(cart: Option<&Cart>) -> Self {
        let Some(cart) = cart else {
            return Self::default();
        };
        Self {
            id: Some(cart.id.clone()),
            checkout_url: cart.checkout_url.clone(),
            lines: cart
                .lines
                .iter()
                .filter(|line| line.quantity > 0)
                .map(|line| CartLine {
                    is_optimistic: false,
                    ..line.clone()
                })
                .collect(),
            total_quantity: cart.total_quantity,
            cost: Some(ProjectedCost {
                subtotal: cart.cost.subtotal,
                total: cart.cost.total,
                total_tax: cart.cost.total_tax,
                estimated: false,
            }),
            discount_codes: cart.discount_codes.clone(),
            applied_gift_cards: cart.applied_gift_cards.clone(),
            buyer_identity: cart.buyer_identity.clone(),
            is_optimistic: false,
        }
    }

    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn line(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }
}

/// Rebuild the displayed cart from the confirmed cart and pending mutations.
///
/// `pending` must be in submission order. Any pending removal hides its lines
/// regardless of where it sits in that order.
pub fn project<'a, I>(confirmed: Option<&Cart>, pending: I) -> CartProjection
where
    I: IntoIterator<Item = (RequestToken, &'a CartAction)>,
{
    let pending: Vec<(RequestToken, &CartAction)> = pending.into_iter().collect();
    let mut projection = CartProjection::confirmed(confirmed);
    if pending.is_empty() {
        return projection;
    }

    let removed: HashSet<&LineId> = pending
        .iter()
        .filter_map(|(_, action)| match action {
            CartAction::LinesRemove(ids) => Some(ids.iter()),
            _ => None,
        })
        .flatten()
        .collect();

    let mut lines_touched = false;
    for (token, action) in &pending {
        lines_touched |= action.kind().touches_lines();
        match action {
            CartAction::LinesAdd(adds) => {
                for (index, add) in adds.iter().enumerate() {
                    add_line(&mut projection.lines, &removed, *token, index, add);
                }
            }
            CartAction::LinesUpdate(updates) => {
                for update in updates {
                    if let Some(line) = projection.lines.iter_mut().find(|l| l.id == update.id) {
                        line.quantity = update.quantity;
                        line.is_optimistic = true;
                        reprice(line);
                    }
                }
            }
            CartAction::LinesRemove(_) => {}
            CartAction::DiscountCodesUpdate(codes) => {
                projection.discount_codes = codes
                    .iter()
                    .map(|code| CartDiscountCode {
                        code: code.clone(),
                        applicable: true,
                    })
                    .collect();
            }
            CartAction::GiftCardCodesUpdate(codes) => {
                projection.applied_gift_cards = codes
                    .iter()
                    .map(|code| AppliedGiftCard::from_code(code))
                    .collect();
            }
            CartAction::BuyerIdentityUpdate(input) => {
                let buyer = projection.buyer_identity.get_or_insert_with(Default::default);
                if let Some(email) = &input.email {
                    buyer.email = Some(email.to_string());
                }
                if let Some(phone) = &input.phone {
                    buyer.phone = Some(phone.clone());
                }
                if let Some(country) = &input.country_code {
                    buyer.country_code = Some(country.to_ascii_uppercase());
                }
            }
        }
    }

    projection
        .lines
        .retain(|line| line.quantity > 0 && !removed.contains(&line.id));

    if lines_touched {
        projection.total_quantity = projection.lines.iter().map(|l| l.quantity).sum();
        projection.cost = estimate_cost(projection.cost, &projection.lines);
    }
    projection.is_optimistic = true;
    projection
}

fn add_line(
    lines: &mut Vec<CartLine>,
    removed: &HashSet<&LineId>,
    token: RequestToken,
    index: usize,
    add: &AddLine,
) {
    let input = &add.input;
    let existing = lines.iter_mut().find(|line| {
        line.merchandise.id == input.merchandise_id
            && line.selling_plan_id == input.selling_plan_id
            && !removed.contains(&line.id)
    });

    if let Some(line) = existing {
        line.quantity = line.quantity.saturating_add(input.quantity);
        line.is_optimistic = true;
        reprice(line);
        return;
    }

    let merchandise = add.merchandise.clone().map_or_else(
        || CartMerchandise::placeholder(input.merchandise_id.clone()),
        |merchandise| CartMerchandise {
            id: input.merchandise_id.clone(),
            ..merchandise
        },
    );
    let mut line = CartLine {
        id: LineId::new(format!("{OPTIMISTIC_LINE_PREFIX}{token}-{index}")),
        quantity: input.quantity,
        merchandise,
        cost: None,
        attributes: input.attributes.clone(),
        selling_plan_id: input.selling_plan_id.clone(),
        is_optimistic: true,
    };
    reprice(&mut line);
    lines.push(line);
}

/// Recompute a line's cost from its unit price and quantity.
fn reprice(line: &mut CartLine) {
    let unit = line
        .cost
        .map(|cost| cost.amount_per_quantity)
        .or(line.merchandise.price);
    let Some(unit) = unit else {
        return;
    };
    if let Ok(subtotal) = unit.times(line.quantity) {
        line.cost = Some(CartLineCost {
            amount_per_quantity: unit,
            subtotal_amount: subtotal,
            total_amount: subtotal,
        });
    }
}

/// Subtotal from line subtotals; the total moves by the same delta.
fn estimate_cost(confirmed: Option<ProjectedCost>, lines: &[CartLine]) -> Option<ProjectedCost> {
    let subtotal = Money::sum(lines.iter().filter_map(|l| l.cost.map(|c| c.subtotal_amount)))
        .ok()?
        .or_else(|| confirmed.map(|c| Money::zero(c.subtotal.currency_code)))?;

    let total = confirmed
        .and_then(|c| {
            let delta = subtotal.checked_sub(c.subtotal).ok()?;
            c.total.checked_add(delta).ok()
        })
        .unwrap_or(subtotal);

    Some(ProjectedCost {
        subtotal,
        total,
        total_tax: confirmed.and_then(|c| c.total_tax),
        estimated: true,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::types::{
        BuyerIdentityInput, CartCost, CartLineInput, CartMerchandiseProduct, CurrencyCode, Email,
        MerchandiseId,
    };

    fn eur(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::EUR)
    }

    fn merchandise(id: &str, price_cents: i64) -> CartMerchandise {
        CartMerchandise {
            id: MerchandiseId::new(id),
            title: "250 ml".to_string(),
            price: Some(eur(price_cents)),
            available_for_sale: true,
            selected_options: Vec::new(),
            image: None,
            product: CartMerchandiseProduct {
                id: None,
                handle: "creme-boucles".to_string(),
                title: "Crème Boucles".to_string(),
            },
        }
    }

    fn line(id: &str, variant: &str, quantity: u32, price_cents: i64) -> CartLine {
        let unit = eur(price_cents);
        let subtotal = unit.times(quantity).unwrap();
        CartLine {
            id: LineId::new(id),
            quantity,
            merchandise: merchandise(variant, price_cents),
            cost: Some(CartLineCost {
                amount_per_quantity: unit,
                subtotal_amount: subtotal,
                total_amount: subtotal,
            }),
            attributes: Vec::new(),
            selling_plan_id: None,
            is_optimistic: false,
        }
    }

    fn cart(lines: Vec<CartLine>) -> Cart {
        let quantity = lines.iter().map(|l| l.quantity).sum();
        let subtotal = Money::sum(lines.iter().filter_map(|l| l.cost.map(|c| c.subtotal_amount)))
            .unwrap()
            .unwrap_or_else(|| eur(0));
        Cart {
            id: CartId::new("gid://shopify/Cart/c1"),
            checkout_url: Some("https://boucle.shop/checkouts/c1".to_string()),
            total_quantity: quantity,
            cost: CartCost {
                subtotal,
                total: subtotal.checked_add(eur(490)).unwrap(),
                total_tax: None,
            },
            lines,
            discount_codes: Vec::new(),
            applied_gift_cards: Vec::new(),
            buyer_identity: None,
            note: None,
            updated_at: None,
        }
    }

    fn token(n: u64) -> RequestToken {
        RequestToken::new(n)
    }

    #[test]
    fn test_no_pending_equals_confirmed() {
        let confirmed = cart(vec![line("L1", "V1", 2, 1000)]);
        let projection = project(Some(&confirmed), []);
        assert_eq!(projection, CartProjection::confirmed(Some(&confirmed)));
        assert!(!projection.is_optimistic);
    }

    #[test]
    fn test_update_replaces_quantity_and_reprices() {
        let confirmed = cart(vec![line("L1", "V1", 2, 1000)]);
        let action = CartAction::update_quantity("L1", 3);
        let projection = project(Some(&confirmed), [(token(1), &action)]);

        let l1 = projection.line(&LineId::new("L1")).unwrap();
        assert_eq!(l1.quantity, 3);
        assert!(l1.is_optimistic);
        assert_eq!(l1.cost.unwrap().subtotal_amount, eur(3000));
        assert_eq!(projection.total_quantity, 3);

        let cost = projection.cost.unwrap();
        assert!(cost.estimated);
        assert_eq!(cost.subtotal, eur(3000));
        // Shipping delta of 4.90 is preserved.
        assert_eq!(cost.total, eur(3490));
    }

    #[test]
    fn test_update_to_zero_removes() {
        let confirmed = cart(vec![line("L1", "V1", 2, 1000), line("L2", "V2", 1, 500)]);
        let action = CartAction::update_quantity("L1", 0);
        let projection = project(Some(&confirmed), [(token(1), &action)]);
        assert!(projection.line(&LineId::new("L1")).is_none());
        assert_eq!(projection.total_quantity, 1);
    }

    #[test]
    fn test_remove_hides_line() {
        let confirmed = cart(vec![line("L1", "V1", 2, 1000)]);
        let action = CartAction::remove_line("L1");
        let projection = project(Some(&confirmed), [(token(1), &action)]);
        assert!(projection.is_empty());
        assert_eq!(projection.total_quantity, 0);
        assert_eq!(projection.cost.unwrap().subtotal, eur(0));
    }

    #[test]
    fn test_removal_wins_over_later_update() {
        let confirmed = cart(vec![line("L1", "V1", 2, 1000)]);
        let remove = CartAction::remove_line("L1");
        let update = CartAction::update_quantity("L1", 5);
        let projection = project(Some(&confirmed), [(token(1), &remove), (token(2), &update)]);
        assert!(projection.line(&LineId::new("L1")).is_none());
    }

    #[test]
    fn test_add_to_empty_cart() {
        let action = CartAction::LinesAdd(vec![AddLine::new(CartLineInput::new("V1", 1))]);
        let projection = project(None, [(token(7), &action)]);

        assert_eq!(projection.line_count(), 1);
        let added = &projection.lines[0];
        assert_eq!(added.merchandise.id, MerchandiseId::new("V1"));
        assert_eq!(added.quantity, 1);
        assert!(added.is_optimistic);
        assert!(added.id.as_str().starts_with(OPTIMISTIC_LINE_PREFIX));
        assert_eq!(projection.total_quantity, 1);
        assert!(projection.id.is_none());
        // No price known, no cost to show.
        assert!(projection.cost.is_none());
    }

    #[test]
    fn test_add_with_merchandise_is_priced() {
        let action = CartAction::LinesAdd(vec![
            AddLine::new(CartLineInput::new("V9", 2)).with_merchandise(merchandise("V9", 1250)),
        ]);
        let projection = project(None, [(token(1), &action)]);
        assert_eq!(projection.cost.unwrap().subtotal, eur(2500));
    }

    #[test]
    fn test_add_existing_merchandise_increments() {
        let confirmed = cart(vec![line("L1", "V1", 2, 1000)]);
        let action = CartAction::LinesAdd(vec![AddLine::new(CartLineInput::new("V1", 1))]);
        let projection = project(Some(&confirmed), [(token(1), &action)]);
        assert_eq!(projection.line_count(), 1);
        assert_eq!(projection.lines[0].quantity, 3);
        assert!(projection.lines[0].is_optimistic);
    }

    #[test]
    fn test_discount_codes_shown_as_applied() {
        let confirmed = cart(Vec::new());
        let action = CartAction::discount_codes(["BOUCLE10"]);
        let projection = project(Some(&confirmed), [(token(1), &action)]);
        assert_eq!(
            projection.discount_codes,
            vec![CartDiscountCode {
                code: "BOUCLE10".to_string(),
                applicable: true
            }]
        );
        // Codes do not touch lines, so the cost stays confirmed.
        assert!(!projection.cost.unwrap().estimated);
    }

    #[test]
    fn test_gift_cards_and_buyer_identity() {
        let confirmed = cart(Vec::new());
        let gift = CartAction::gift_card_codes(["GIFT-0000-9876"]);
        let buyer = CartAction::BuyerIdentityUpdate(BuyerIdentityInput {
            email: Some(Email::parse("lea@boucle.shop").unwrap()),
            phone: None,
            country_code: Some("fr".to_string()),
        });
        let projection = project(Some(&confirmed), [(token(1), &gift), (token(2), &buyer)]);

        assert_eq!(projection.applied_gift_cards[0].last_characters, "9876");
        let identity = projection.buyer_identity.unwrap();
        assert_eq!(identity.email.as_deref(), Some("lea@boucle.shop"));
        assert_eq!(identity.country_code.as_deref(), Some("FR"));
    }
}
