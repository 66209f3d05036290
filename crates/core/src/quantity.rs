//! Exact-decimal stock quantity.
//!
//! Quantities are exact decimals, never binary floating point, so repeated
//! partial conversions and fractional-unit adjustments (e.g. grams) cannot
//! accumulate rounding drift. The same type carries both stored cell values
//! (non-negative) and signed ledger deltas.

use core::ops::{Add, Neg, Sub};
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::value_object::ValueObject;

/// A stock quantity or signed quantity delta.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Scale by a pure decimal ratio (e.g. grams of parent per variant unit).
    pub fn scaled_by(&self, ratio: Decimal) -> Quantity {
        Quantity(self.0 * ratio)
    }
}

impl ValueObject for Quantity {}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Quantity {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s)
            .map_err(|e| InventoryError::invalid_quantity(format!("'{s}': {e}")))?;
        Ok(Self(value))
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 - rhs.0)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity(-self.0)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn fractional_arithmetic_is_exact() {
        // 0.1 + 0.2 is exactly 0.3 in decimal, unlike f64.
        assert_eq!(qty("0.1") + qty("0.2"), qty("0.3"));
        assert_eq!(qty("1") - qty("0.9"), qty("0.1"));
    }

    #[test]
    fn scaling_keeps_decimal_precision() {
        let ratio = "0.25".parse::<Decimal>().unwrap();
        assert_eq!(qty("3").scaled_by(ratio), qty("0.75"));
    }

    #[test]
    fn sign_checks() {
        assert!(qty("-1").is_negative());
        assert!(qty("0.001").is_positive());
        assert!(Quantity::ZERO.is_zero());
        assert_eq!(-qty("5"), qty("-5"));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!("ten".parse::<Quantity>().is_err());
    }
}
