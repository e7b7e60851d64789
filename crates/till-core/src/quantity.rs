//! # Quantity Module
//!
//! Line-item quantities. Most lines are whole units from a scanner, but
//! weighed or measured goods are keyed in with up to two decimals
//! (`1.25` kg), so a quantity is a decimal with a fixed precision of 0.01.
//!
//! ## Storage
//! Persisted as integer hundredths (`quantity_hundredths`), the same way
//! money is persisted as integer cents.
//!
//! ## Stock Units
//! Shelf stock is counted in whole units. A fractional line consumes
//! `ceil(quantity)` units: a started unit has left the shelf.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::MAX_LINE_QUANTITY;

/// A quantity with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    /// Smallest quantity a line may carry (0.01).
    #[inline]
    pub fn min_line() -> Self {
        Quantity::from_hundredths(1)
    }

    /// Creates a whole-unit quantity.
    #[inline]
    pub fn from_units(units: i64) -> Self {
        Quantity(Decimal::from(units))
    }

    /// Creates a quantity from integer hundredths (`150` = 1.50).
    #[inline]
    pub fn from_hundredths(hundredths: i64) -> Self {
        Quantity(Decimal::new(hundredths, 2).normalize())
    }

    /// Creates a quantity from a decimal, rejecting more than two decimals.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use till_core::Quantity;
    ///
    /// assert!(Quantity::try_from_decimal(Decimal::new(125, 2)).is_ok());  // 1.25
    /// assert!(Quantity::try_from_decimal(Decimal::new(1255, 3)).is_err()); // 1.255
    /// ```
    pub fn try_from_decimal(value: Decimal) -> CoreResult<Self> {
        let value = value.normalize();
        if value.scale() > 2 {
            return Err(CoreError::invalid_quantity(
                value,
                "at most two decimal places",
            ));
        }
        Ok(Quantity(value))
    }

    /// Returns the exact decimal value.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns the quantity as integer hundredths (storage form).
    pub fn hundredths(&self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED).to_i64().unwrap_or(i64::MAX)
    }

    /// Whole stock units this quantity removes from the shelf.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(3).stock_units(), 3);
    /// assert_eq!(Quantity::from_hundredths(125).stock_units(), 2);
    /// ```
    pub fn stock_units(&self) -> i64 {
        self.0.ceil().to_i64().unwrap_or(i64::MAX)
    }

    /// Checks that this is a valid quantity for an order line.
    ///
    /// ## Rules
    /// - At least 0.01 (zero is never a line quantity; remove the line)
    /// - At most `MAX_LINE_QUANTITY` units
    pub fn validate_for_line(&self) -> CoreResult<()> {
        if *self < Self::min_line() {
            return Err(CoreError::invalid_quantity(
                self,
                "must be at least 0.01",
            ));
        }

        if self.0 > Decimal::from(MAX_LINE_QUANTITY) {
            return Err(CoreError::invalid_quantity(
                self,
                format!("cannot exceed {}", MAX_LINE_QUANTITY),
            ));
        }

        Ok(())
    }

    /// Checks if the quantity is greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::from_units(1)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Quantity((self.0 + other.0).normalize())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| CoreError::invalid_quantity(s, "not a number"))?;
        Quantity::try_from_decimal(value)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = CoreError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Quantity::try_from_decimal(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(q: Quantity) -> Self {
        q.0
    }
}
