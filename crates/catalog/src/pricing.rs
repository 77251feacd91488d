//! Price and discount value objects.
//!
//! The discounted price is never stored; it is derived with [`discounted_price`] whenever a
//! listing is computed.

use serde::{Deserialize, Serialize};

use storefront_core::{CatalogError, ValueObject};

/// Non-negative, finite unit price.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> Result<Self, CatalogError> {
        if !value.is_finite() || value < 0.0 {
            return Err(CatalogError::validation(format!(
                "price must be a finite non-negative number, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Price {
    type Error = CatalogError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for f64 {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl ValueObject for Price {}

/// Percentage discount in `0..=100`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Discount(u8);

impl Discount {
    pub const NONE: Discount = Discount(0);

    pub fn new(percent: u8) -> Result<Self, CatalogError> {
        if percent > 100 {
            return Err(CatalogError::validation(format!(
                "discount must be between 0 and 100, got {percent}"
            )));
        }
        Ok(Self(percent))
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Discount {
    type Error = CatalogError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Discount> for u8 {
    fn from(value: Discount) -> Self {
        value.0
    }
}

impl ValueObject for Discount {}

/// `price × (1 − discount/100)`, computed as `price × (100 − discount) / 100` so that
/// whole-number prices with whole-number discounts stay exact.
pub fn discounted_price(price: Price, discount: Discount) -> f64 {
    price.0 * f64::from(100 - discount.0) / 100.0
}
