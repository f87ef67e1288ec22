//! Cart type conversion functions.

use tracing::warn;

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    AppliedGiftCard, Attribute, Cart, CartBuyerIdentity, CartCost, CartDiscountCode, CartId,
    CartLine, CartLineCost, CartMerchandise, CartMerchandiseProduct, CartMutationPayload,
    CartUserError, CartWarning, Image, LineId, MerchandiseId, Money, ProductId, SelectedOption,
    SellingPlanId,
};

use super::super::queries::{
    AttributeNode, CartLineNode, CartMutationData, CartNode, ImageNode, MerchandiseNode, MoneyV2,
    UserErrorNode, WarningNode,
};

/// Parse a `MoneyV2` into [`Money`].
///
/// # Errors
///
/// Returns an error for unknown currencies or malformed amounts.
pub fn convert_money(money: &MoneyV2) -> Result<Money, ShopifyError> {
    Ok(Money::parse(&money.amount, &money.currency_code)?)
}

pub fn convert_image(image: ImageNode) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

fn convert_attribute(attribute: AttributeNode) -> Attribute {
    Attribute {
        key: attribute.key,
        value: attribute.value,
    }
}

/// Convert a wire cart.
///
/// Lines whose merchandise is not a product variant are skipped.
///
/// # Errors
///
/// Returns an error if a money amount cannot be parsed.
pub fn convert_cart(cart: CartNode) -> Result<Cart, ShopifyError> {
    let lines = cart
        .lines
        .nodes
        .into_iter()
        .filter_map(|line| convert_cart_line(line).transpose())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Cart {
        id: CartId::new(cart.id),
        checkout_url: cart.checkout_url,
        total_quantity: u32::try_from(cart.total_quantity).unwrap_or(0),
        cost: CartCost {
            subtotal: convert_money(&cart.cost.subtotal_amount)?,
            total: convert_money(&cart.cost.total_amount)?,
            total_tax: cart
                .cost
                .total_tax_amount
                .as_ref()
                .map(convert_money)
                .transpose()?,
        },
        lines,
        discount_codes: cart
            .discount_codes
            .into_iter()
            .map(|d| CartDiscountCode {
                code: d.code,
                applicable: d.applicable,
            })
            .collect(),
        applied_gift_cards: cart
            .applied_gift_cards
            .into_iter()
            .map(|g| {
                Ok(AppliedGiftCard {
                    id: Some(g.id),
                    last_characters: g.last_characters,
                    amount_used: g.amount_used.as_ref().map(convert_money).transpose()?,
                })
            })
            .collect::<Result<Vec<_>, ShopifyError>>()?,
        buyer_identity: cart.buyer_identity.map(|b| CartBuyerIdentity {
            email: b.email,
            phone: b.phone,
            country_code: b.country_code,
        }),
        note: cart.note,
        updated_at: cart.updated_at,
    })
}

fn convert_cart_line(line: CartLineNode) -> Result<Option<CartLine>, ShopifyError> {
    let Some(merchandise) = convert_merchandise(line.merchandise)? else {
        warn!(line_id = %line.id, "Cart line merchandise is not a product variant");
        return Ok(None);
    };

    Ok(Some(CartLine {
        id: LineId::new(line.id),
        quantity: u32::try_from(line.quantity).unwrap_or(0),
        merchandise,
        cost: Some(CartLineCost {
            amount_per_quantity: convert_money(&line.cost.amount_per_quantity)?,
            subtotal_amount: convert_money(&line.cost.subtotal_amount)?,
            total_amount: convert_money(&line.cost.total_amount)?,
        }),
        attributes: line.attributes.into_iter().map(convert_attribute).collect(),
        selling_plan_id: line
            .selling_plan_allocation
            .map(|a| SellingPlanId::new(a.selling_plan.id)),
        is_optimistic: false,
    }))
}

fn convert_merchandise(v: MerchandiseNode) -> Result<Option<CartMerchandise>, ShopifyError> {
    let (Some(id), Some(product)) = (v.id, v.product) else {
        return Ok(None);
    };
    Ok(Some(CartMerchandise {
        id: MerchandiseId::new(id),
        title: v.title,
        price: v.price.as_ref().map(convert_money).transpose()?,
        available_for_sale: v.available_for_sale,
        selected_options: v
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
        image: v.image.map(convert_image),
        product: CartMerchandiseProduct {
            id: Some(ProductId::new(product.id)),
            handle: product.handle,
            title: product.title,
        },
    }))
}

// =============================================================================
// Mutation Payloads
// =============================================================================

pub fn convert_user_error(error: UserErrorNode) -> CartUserError {
    CartUserError {
        code: error.code,
        field: error.field.unwrap_or_default(),
        message: error.message,
    }
}

fn convert_warning(warning: WarningNode) -> CartWarning {
    CartWarning {
        code: warning.code,
        message: warning.message,
        target: warning.target,
    }
}

/// Convert the response of any cart mutation.
///
/// User errors are kept in the payload, not turned into an error, so the
/// caller sees them alongside the cart Shopify returned.
///
/// # Errors
///
/// Returns an error if the payload is missing or a money amount is malformed.
pub fn convert_payload(
    data: CartMutationData,
    operation: &str,
) -> Result<CartMutationPayload, ShopifyError> {
    let payload = data
        .payload
        .ok_or_else(|| ShopifyError::NotFound(format!("{operation} returned no payload")))?;

    Ok(CartMutationPayload {
        cart: payload.cart.map(convert_cart).transpose()?,
        user_errors: payload
            .user_errors
            .into_iter()
            .map(convert_user_error)
            .collect(),
        warnings: payload.warnings.into_iter().map(convert_warning).collect(),
    })
}
