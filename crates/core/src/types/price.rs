//! Type-safe money representation using decimal arithmetic.
//!
//! Shopify returns amounts as decimal strings (`"19.90"`) next to an ISO 4217
//! currency code. The optimistic cart recomputes line totals locally, so the
//! arithmetic here refuses to mix currencies instead of guessing.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors produced by money parsing and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// The currency code is not one the storefront sells in.
    #[error("unsupported currency code: {0}")]
    UnknownCurrency(String),
    /// The amount string is not a decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// Two amounts in different currencies were combined.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: CurrencyCode,
        /// Currency of the right operand.
        right: CurrencyCode,
    },
    /// The result does not fit in a `Decimal`.
    #[error("amount overflow")]
    Overflow,
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
    CAD,
    AUD,
    CHF,
}

impl CurrencyCode {
    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::CHF => "CHF",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::CHF => "CHF ",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            "CHF" => Ok(Self::CHF),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// An amount of money in a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Build from the smallest currency unit (cents).
    #[must_use]
    pub fn from_cents(cents: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(cents, 2), currency_code)
    }

    /// Parse Shopify's `(amount, currencyCode)` string pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a decimal or the currency is unknown.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| MoneyError::InvalidAmount(amount.to_string()))?;
        Ok(Self::new(amount, currency_code.parse()?))
    }

    /// Multiply a unit price by a quantity.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the product does not fit.
    pub fn times(self, quantity: u32) -> Result<Self, MoneyError> {
        self.amount
            .checked_mul(Decimal::from(quantity))
            .map(|amount| Self::new(amount, self.currency_code))
            .ok_or(MoneyError::Overflow)
    }

    /// Add two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns an error on currency mismatch or overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.same_currency(other)?;
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency_code))
            .ok_or(MoneyError::Overflow)
    }

    /// Subtract an amount of the same currency.
    ///
    /// # Errors
    ///
    /// Returns an error on currency mismatch or overflow.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.same_currency(other)?;
        self.amount
            .checked_sub(other.amount)
            .map(|amount| Self::new(amount, self.currency_code))
            .ok_or(MoneyError::Overflow)
    }

    /// Sum a sequence of amounts; `None` for an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns an error on currency mismatch or overflow.
    pub fn sum<I>(amounts: I) -> Result<Option<Self>, MoneyError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(None, |acc: Option<Self>, next| match acc {
                None => Ok(Some(next)),
                Some(total) => total.checked_add(next).map(Some),
            })
    }

    fn same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.currency_code == other.currency_code {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency_code,
                right: other.currency_code,
            })
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.amount.round_dp(2))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shopify_amount() {
        let money = Money::parse("19.90", "EUR").unwrap();
        assert_eq!(money, Money::from_cents(1990, CurrencyCode::EUR));
    }

    #[test]
    fn test_parse_rejects_unknown_currency() {
        let err = Money::parse("1.00", "XYZ").unwrap_err();
        assert_eq!(err, MoneyError::UnknownCurrency("XYZ".to_string()));
    }

    #[test]
    fn test_times_quantity() {
        let unit = Money::from_cents(1250, CurrencyCode::EUR);
        assert_eq!(unit.times(3).unwrap(), Money::from_cents(3750, CurrencyCode::EUR));
    }

    #[test]
    fn test_add_refuses_mixed_currencies() {
        let eur = Money::from_cents(100, CurrencyCode::EUR);
        let usd = Money::from_cents(100, CurrencyCode::USD);
        assert!(matches!(
            eur.checked_add(usd),
            Err(MoneyError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_sum() {
        let amounts = [
            Money::from_cents(100, CurrencyCode::EUR),
            Money::from_cents(250, CurrencyCode::EUR),
        ];
        assert_eq!(
            Money::sum(amounts).unwrap(),
            Some(Money::from_cents(350, CurrencyCode::EUR))
        );
        assert_eq!(Money::sum(Vec::new()).unwrap(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1990, CurrencyCode::EUR).to_string(), "€19.90");
        assert_eq!(Money::from_cents(5, CurrencyCode::USD).to_string(), "$0.05");
    }
}
