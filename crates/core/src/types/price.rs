//! Type-safe price representation using decimal arithmetic.
//!
//! The commerce backend is the source of truth for every price. These types
//! only carry what the backend reported; the single piece of arithmetic is a
//! display subtotal used when the backend omits a formatted one.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is not a decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// The currency code is not a three-letter ISO 4217 code.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// A price with currency information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "EUR").
    pub currency_code: String,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: String) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Parse a price from the string representation the backend sends.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a decimal or the currency code
    /// is not three ASCII letters.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| PriceError::InvalidAmount(amount.to_owned()))?;

        let code = currency_code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PriceError::InvalidCurrency(currency_code.to_owned()));
        }

        Ok(Self::new(amount, code))
    }

    /// Zero in the given currency.
    #[must_use]
    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency_code.into())
    }

    /// The price multiplied by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(
            self.amount * Decimal::from(quantity),
            self.currency_code.clone(),
        )
    }

    /// Plain display (e.g., "12.50 EUR").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:.2} {}", self.amount, self.currency_code)
    }
}
