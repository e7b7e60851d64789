//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Two Representations, One Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  STORED / DISPLAYED                 COMPUTED                            │
//! │                                                                         │
//! │  Money(i64 cents)  ──to_decimal──►  Decimal (unrounded)                 │
//! │                                        │                                │
//! │                                        │  qty × price, − discount,      │
//! │                                        │  × tax rate, − payment ...     │
//! │                                        ▼                                │
//! │  Money(i64 cents)  ◄─from_decimal──  Decimal (unrounded)                │
//! │                      round ONCE, half away from zero, 2 dp              │
//! │                                                                         │
//! │  Rounding between steps compounds error:                               │
//! │    1.5 × 3.33 = 4.995, +15% tax = 5.74425 → 5.74                        │
//! │    rounded early: 5.00 + 0.75 = 5.75 (one cent drift)                   │
//! │  so intermediate steps never round.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2;             // $21.98
//! assert_eq!(doubled.cents(), 2198);
//!
//! let parsed: Money = "12.5".parse().unwrap();
//! assert_eq!(parsed.cents(), 1250);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Customer balances go negative when the store owes
///   the customer (credit).
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support; serializes as the bare cent count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Rounds an unrounded decimal amount to cents.
    ///
    /// This is THE rounding boundary of the crate: round half away from
    /// zero, two decimal places, applied once.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use till_core::money::Money;
    ///
    /// let amount = Decimal::new(4995, 3); // 4.995
    /// assert_eq!(Money::from_decimal(amount).unwrap().cents(), 500);
    /// ```
    pub fn from_decimal(amount: Decimal) -> CoreResult<Money> {
        let cents = (amount * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        cents
            .to_i64()
            .map(Money)
            .ok_or_else(|| CoreError::Overflow(amount.to_string()))
    }

    /// Returns the exact decimal value (e.g. `10.99`).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money as a plain two-decimal amount.
///
/// Currency symbols are a terminal concern (see the terminal config).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

/// Parses operator input such as `"12"`, `"12.5"` or `"12.50"`.
///
/// More than two decimal places is rejected rather than silently rounded:
/// the operator typed something the till cannot tender.
impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| CoreError::invalid_amount(s, "not a number"))?;

        if value.normalize().scale() > 2 {
            return Err(CoreError::invalid_amount(s, "more than two decimal places"));
        }

        Money::from_decimal(value)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
