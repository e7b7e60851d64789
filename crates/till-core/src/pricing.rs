//! # Pricing
//!
//! Derives the order totals from line items, discount and tax settings.
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Order Pricing (unrounded)                          │
//! │                                                                         │
//! │  subtotal = Σ line.quantity × line.unit_price                          │
//! │  discount = fixed amount                 (Discount::Fixed)             │
//! │           | subtotal × pct / 100         (Discount::Percentage)        │
//! │           capped at subtotal                                            │
//! │  taxable  = subtotal − discount                                        │
//! │  tax      = taxable × rate               (0 when tax disabled)         │
//! │  total    = taxable + tax                                              │
//! │  change   = max(0, payment − total)                                    │
//! │                                                                         │
//! │  Totals ──rounded()──► RoundedTotals   (each field rounded once, 2 dp)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is cached: [`compute_totals`] is re-run from the line items
//! every time totals are asked for, so there is no stored figure that can
//! drift from its inputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::money::Money;
use crate::order::{Discount, LineItem};
use crate::types::TaxRate;

/// Unrounded order totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub taxable: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// Amount tendered, once payment has begun.
    pub payment: Option<Decimal>,
    pub change: Decimal,
}

impl Totals {
    /// Rounds every figure to cents. This is the only place order totals
    /// are rounded.
    ///
    /// Each field is rounded from its own unrounded value, so the rounded
    /// parts need not add up: 1.5 × 3.33 at 15% gives subtotal 5.00 and
    /// tax 0.75 but total 5.74. Read `total` as stored; never rebuild it
    /// from `taxable + tax`.
    pub fn rounded(&self) -> CoreResult<RoundedTotals> {
        Ok(RoundedTotals {
            subtotal: Money::from_decimal(self.subtotal)?,
            discount: Money::from_decimal(self.discount)?,
            taxable: Money::from_decimal(self.taxable)?,
            tax: Money::from_decimal(self.tax)?,
            total: Money::from_decimal(self.total)?,
            payment: self.payment.map(Money::from_decimal).transpose()?,
            change: Money::from_decimal(self.change)?,
        })
    }
}

/// Totals rounded to cents, for display and for the persisted sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundedTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub taxable: Money,
    pub tax: Money,
    pub total: Money,
    pub payment: Option<Money>,
    pub change: Money,
}

impl RoundedTotals {
    /// Amount still owed when the tender is short of the total.
    pub fn shortfall(&self) -> Option<Money> {
        let payment = self.payment?;
        if payment < self.total {
            Some(self.total - payment)
        } else {
            None
        }
    }
}

/// Computes totals from scratch.
///
/// `tax_rate` is `None` when tax is switched off for the order.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use till_core::pricing::compute_totals;
/// use till_core::{Discount, Money, TaxRate};
///
/// let totals = compute_totals(
///     &[],
///     &Discount::Fixed(Money::from_cents(500)),
///     Some(TaxRate::from_bps(1500)),
///     None,
/// );
/// // Discount never exceeds what is being sold
/// assert_eq!(totals.discount, Decimal::ZERO);
/// assert_eq!(totals.total, Decimal::ZERO);
/// ```
pub fn compute_totals(
    lines: &[LineItem],
    discount: &Discount,
    tax_rate: Option<TaxRate>,
    payment: Option<Money>,
) -> Totals {
    let subtotal: Decimal = lines.iter().map(LineItem::line_total).sum();

    let requested = match discount {
        Discount::None => Decimal::ZERO,
        Discount::Percentage(pct) => subtotal * *pct / Decimal::ONE_HUNDRED,
        Discount::Fixed(amount) => amount.to_decimal(),
    };
    let discount = requested.min(subtotal);

    let taxable = subtotal - discount;
    let tax = match tax_rate {
        Some(rate) => taxable * rate.as_fraction(),
        None => Decimal::ZERO,
    };
    let total = taxable + tax;

    let payment = payment.map(|p| p.to_decimal());
    let change = payment
        .map(|p| (p - total).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO);

    Totals {
        subtotal,
        discount,
        taxable,
        tax,
        total,
        payment,
        change,
    }
}
