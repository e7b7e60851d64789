//! # Order Engine
//!
//! The in-memory order (cart) for one checkout, and its state machine.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Order States                                    │
//! │                                                                         │
//! │            add_item                 begin_payment                       │
//! │   ┌───────┐ ───────► ┌──────────┐ ──────────────► ┌─────────────────┐  │
//! │   │ Empty │          │ Building │                 │ AwaitingPayment │  │
//! │   └───────┘ ◄─────── └──────────┘ ◄────────────── └────────┬────────┘  │
//! │       ▲    cancel /    last line    abort_payment          │           │
//! │       │    removed                                         │ commit    │
//! │       │                                                    ▼           │
//! │       └──────────── cancel (any but Committed)      ┌───────────┐      │
//! │                                                     │ Committed │      │
//! │                                                     └───────────┘      │
//! │                                                      terminal          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commit Protocol
//! The order never touches storage. Committing is two calls around the
//! storage transaction:
//!
//! 1. [`Order::prepare_commit`] snapshots the order into a [`SaleDraft`]
//!    (receipt number, rounded totals, lines). The order is unchanged.
//! 2. The caller writes stock, sale and customer effects in one transaction.
//! 3. On success, [`Order::mark_committed`]. On failure the order is still
//!    `AwaitingPayment` and the operator may retry or abort the payment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{compute_totals, RoundedTotals, Totals};
use crate::quantity::Quantity;
use crate::types::{Product, TaxRate};
use crate::validation::{
    validate_discount_cents, validate_discount_percentage, validate_order_size,
    validate_tender_cents,
};

// =============================================================================
// Order State
// =============================================================================

/// Lifecycle state of an [`Order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// No lines yet.
    Empty,
    /// At least one line; lines, discount, tax and customer may change.
    Building,
    /// Payment entered; the order is frozen until commit or abort.
    AwaitingPayment,
    /// Persisted. Terminal for this order instance.
    Committed,
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderState::Empty => "empty",
            OrderState::Building => "building",
            OrderState::AwaitingPayment => "awaiting payment",
            OrderState::Committed => "committed",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Order-level discount. Percentage and fixed amount are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    /// Percentage of the subtotal, 0 to 100.
    Percentage(Decimal),
    /// Fixed amount off the subtotal.
    Fixed(Money),
}

// =============================================================================
// Line Item
// =============================================================================

/// One product entry in an order.
///
/// `description` and `unit_price` are snapshots taken when the product was
/// first added; later catalog edits do not reach an open order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: i64,
    /// Merge key: adding the same barcode again bumps this line's quantity.
    pub barcode: String,
    pub description: String,
    pub unit_price: Money,
    pub quantity: Quantity,
}

impl LineItem {
    fn from_product(product: &Product, quantity: Quantity) -> Self {
        LineItem {
            product_id: product.id,
            barcode: product.barcode.clone(),
            description: product.name.clone(),
            unit_price: product.sale_price(),
            quantity,
        }
    }

    /// Unrounded `quantity × unit_price`, recomputed on every call.
    #[inline]
    pub fn line_total(&self) -> Decimal {
        self.quantity.to_decimal() * self.unit_price.to_decimal()
    }
}

/// Weak reference to the customer the order is charged to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Outputs
// =============================================================================

/// Result of entering a payment amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub total: Money,
    pub tendered: Money,
    pub change: Money,
    /// Set when the tender is short of the total. Commit is still allowed;
    /// the caller decides whether to confirm or abort.
    pub shortfall: Option<Money>,
}

/// A line as it will be written to the sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineDraft {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub total_price: Money,
    /// Whole units to take off the shelf.
    pub stock_units: i64,
}

/// Snapshot of an order ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDraft {
    pub receipt_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer: Option<CustomerRef>,
    pub totals: RoundedTotals,
    pub payment: Money,
    pub lines: Vec<SaleLineDraft>,
}

impl SaleDraft {
    /// Number of lines sold, for the customer ledger description.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }
}

/// One line of an [`OrderSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSummary {
    pub index: usize,
    pub barcode: String,
    pub description: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Serializable view of the whole order, for display and receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub state: OrderState,
    pub lines: Vec<LineSummary>,
    pub discount: Discount,
    pub tax_enabled: bool,
    pub tax_rate_bps: u32,
    pub customer: Option<CustomerRef>,
    pub totals: RoundedTotals,
}

// =============================================================================
// Order
// =============================================================================

/// The in-progress order owned by one checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    lines: Vec<LineItem>,
    discount: Discount,
    tax_rate: TaxRate,
    tax_enabled: bool,
    tax_enabled_default: bool,
    customer: Option<CustomerRef>,
    payment: Option<Money>,
    state: OrderState,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Creates an empty order with tax enabled.
    pub fn new(tax_rate: TaxRate) -> Self {
        Self::with_tax_default(tax_rate, true)
    }

    /// Creates an empty order with the given tax default.
    pub fn with_tax_default(tax_rate: TaxRate, tax_enabled: bool) -> Self {
        Order {
            lines: Vec::new(),
            discount: Discount::None,
            tax_rate,
            tax_enabled,
            tax_enabled_default: tax_enabled,
            customer: None,
            payment: None,
            state: OrderState::Empty,
            created_at: Utc::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn discount(&self) -> Discount {
        self.discount
    }

    /// Percentage discount in effect, zero when none or fixed.
    pub fn discount_percentage(&self) -> Decimal {
        match self.discount {
            Discount::Percentage(pct) => pct,
            _ => Decimal::ZERO,
        }
    }

    /// Fixed discount in effect, zero when none or percentage.
    pub fn discount_amount(&self) -> Money {
        match self.discount {
            Discount::Fixed(amount) => amount,
            _ => Money::zero(),
        }
    }

    pub fn tax_enabled(&self) -> bool {
        self.tax_enabled
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn customer(&self) -> Option<&CustomerRef> {
        self.customer.as_ref()
    }

    pub fn payment(&self) -> Option<Money> {
        self.payment
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // -------------------------------------------------------------------------
    // Lines
    // -------------------------------------------------------------------------

    /// Adds a product, merging into an existing line with the same barcode.
    ///
    /// ## Returns
    /// Index of the line that now holds the product.
    pub fn add_item(&mut self, product: &Product, quantity: Quantity) -> CoreResult<usize> {
        self.require_editable("add item")?;
        quantity.validate_for_line()?;

        if let Some(index) = self.lines.iter().position(|l| l.barcode == product.barcode) {
            let merged = self.lines[index].quantity + quantity;
            merged.validate_for_line()?;
            self.lines[index].quantity = merged;
            self.state = OrderState::Building;
            return Ok(index);
        }

        validate_order_size(self.lines.len()).map_err(|_| CoreError::OrderTooLarge {
            max: crate::MAX_ORDER_LINES,
        })?;

        self.lines.push(LineItem::from_product(product, quantity));
        self.state = OrderState::Building;
        Ok(self.lines.len() - 1)
    }

    /// Removes a line. Removing the last line empties the order.
    pub fn remove_item(&mut self, index: usize) -> CoreResult<LineItem> {
        self.require_state("remove item", OrderState::Building)?;
        self.check_index(index)?;

        let removed = self.lines.remove(index);
        self.settle_after_removal();
        Ok(removed)
    }

    /// Removes the most recently appended line.
    pub fn void_last_item(&mut self) -> CoreResult<LineItem> {
        self.require_state("void last item", OrderState::Building)?;

        let removed = self.lines.pop().ok_or(CoreError::EmptyOrder)?;
        self.settle_after_removal();
        Ok(removed)
    }

    /// Replaces a line's quantity. Zero is rejected; use `remove_item`.
    pub fn set_quantity(&mut self, index: usize, quantity: Quantity) -> CoreResult<()> {
        self.require_state("set quantity", OrderState::Building)?;
        self.check_index(index)?;
        quantity.validate_for_line()?;

        self.lines[index].quantity = quantity;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Discount, tax, customer
    // -------------------------------------------------------------------------

    /// Sets a percentage discount (0 to 100), clearing any fixed discount.
    pub fn set_percentage_discount(&mut self, pct: Decimal) -> CoreResult<()> {
        self.require_editable("set discount")?;
        validate_discount_percentage(pct)?;

        self.discount = if pct.is_zero() {
            Discount::None
        } else {
            Discount::Percentage(pct.normalize())
        };
        Ok(())
    }

    /// Sets a fixed discount, clearing any percentage discount.
    pub fn set_fixed_discount(&mut self, amount: Money) -> CoreResult<()> {
        self.require_editable("set discount")?;
        validate_discount_cents(amount.cents())?;

        self.discount = if amount.is_zero() {
            Discount::None
        } else {
            Discount::Fixed(amount)
        };
        Ok(())
    }

    pub fn clear_discount(&mut self) -> CoreResult<()> {
        self.require_editable("clear discount")?;
        self.discount = Discount::None;
        Ok(())
    }

    /// Switches tax on or off for this order.
    pub fn set_tax_enabled(&mut self, enabled: bool) -> CoreResult<()> {
        self.require_editable("toggle tax")?;
        self.tax_enabled = enabled;
        Ok(())
    }

    /// Charges the order to a customer. Credit limits are not checked.
    pub fn attach_customer(&mut self, customer: CustomerRef) -> CoreResult<()> {
        self.require_editable("attach customer")?;
        self.customer = Some(customer);
        Ok(())
    }

    pub fn detach_customer(&mut self) -> CoreResult<Option<CustomerRef>> {
        self.require_editable("detach customer")?;
        Ok(self.customer.take())
    }

    // -------------------------------------------------------------------------
    // Payment and commit
    // -------------------------------------------------------------------------

    /// Records the tendered amount and freezes the order for commit.
    ///
    /// A tender below the total is accepted and reported through
    /// [`PaymentStatus::shortfall`].
    pub fn begin_payment(&mut self, amount: Money) -> CoreResult<PaymentStatus> {
        if self.state == OrderState::Empty {
            return Err(CoreError::EmptyOrder);
        }
        self.require_state("begin payment", OrderState::Building)?;
        validate_tender_cents(amount.cents())
            .map_err(|_| CoreError::invalid_amount(amount, "payment cannot be negative"))?;

        let totals = self.compute(Some(amount)).rounded()?;

        self.payment = Some(amount);
        self.state = OrderState::AwaitingPayment;

        Ok(PaymentStatus {
            total: totals.total,
            tendered: amount,
            change: totals.change,
            shortfall: totals.shortfall(),
        })
    }

    /// Backs out of payment entry, returning to `Building`.
    pub fn abort_payment(&mut self) -> CoreResult<()> {
        self.require_state("abort payment", OrderState::AwaitingPayment)?;
        self.payment = None;
        self.state = OrderState::Building;
        Ok(())
    }

    /// Snapshots the order for persistence. Does not change state.
    pub fn prepare_commit(&self, now: DateTime<Utc>) -> CoreResult<SaleDraft> {
        self.require_state("commit", OrderState::AwaitingPayment)?;

        let totals = self.totals().rounded()?;
        let lines = self
            .lines
            .iter()
            .map(|line| {
                Ok(SaleLineDraft {
                    product_id: line.product_id,
                    product_name: line.description.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    total_price: Money::from_decimal(line.line_total())?,
                    stock_units: line.quantity.stock_units(),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(SaleDraft {
            receipt_number: generate_receipt_number(now),
            sale_date: now,
            customer: self.customer.clone(),
            totals,
            payment: self.payment.unwrap_or_default(),
            lines,
        })
    }

    /// Marks the order committed once its sale has been persisted.
    pub fn mark_committed(&mut self) -> CoreResult<()> {
        self.require_state("commit", OrderState::AwaitingPayment)?;
        self.state = OrderState::Committed;
        Ok(())
    }

    /// Discards everything and returns to `Empty`.
    pub fn cancel(&mut self) -> CoreResult<()> {
        if self.state == OrderState::Committed {
            return Err(CoreError::invalid_state("cancel", self.state));
        }

        self.lines.clear();
        self.discount = Discount::None;
        self.tax_enabled = self.tax_enabled_default;
        self.customer = None;
        self.payment = None;
        self.state = OrderState::Empty;
        self.created_at = Utc::now();
        Ok(())
    }

    /// Alias for [`Order::cancel`] used by the "new order" action.
    pub fn reset(&mut self) -> CoreResult<()> {
        self.cancel()
    }

    // -------------------------------------------------------------------------
    // Totals
    // -------------------------------------------------------------------------

    /// Unrounded totals, recomputed from the current lines.
    pub fn totals(&self) -> Totals {
        self.compute(self.payment)
    }

    /// Serializable view with rounded totals.
    pub fn summary(&self) -> CoreResult<OrderSummary> {
        let lines = self
            .lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                Ok(LineSummary {
                    index,
                    barcode: line.barcode.clone(),
                    description: line.description.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: Money::from_decimal(line.line_total())?,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(OrderSummary {
            state: self.state,
            lines,
            discount: self.discount,
            tax_enabled: self.tax_enabled,
            tax_rate_bps: self.tax_rate.bps(),
            customer: self.customer.clone(),
            totals: self.totals().rounded()?,
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn compute(&self, payment: Option<Money>) -> Totals {
        let tax = self.tax_enabled.then_some(self.tax_rate);
        compute_totals(&self.lines, &self.discount, tax, payment)
    }

    fn require_state(&self, operation: &'static str, expected: OrderState) -> CoreResult<()> {
        if self.state != expected {
            return Err(CoreError::invalid_state(operation, self.state));
        }
        Ok(())
    }

    fn require_editable(&self, operation: &'static str) -> CoreResult<()> {
        match self.state {
            OrderState::Empty | OrderState::Building => Ok(()),
            state => Err(CoreError::invalid_state(operation, state)),
        }
    }

    fn check_index(&self, index: usize) -> CoreResult<()> {
        if index >= self.lines.len() {
            return Err(CoreError::LineNotFound {
                index,
                len: self.lines.len(),
            });
        }
        Ok(())
    }

    fn settle_after_removal(&mut self) {
        if self.lines.is_empty() {
            self.state = OrderState::Empty;
        }
    }
}

/// Builds a receipt number from the commit time: `R` + `YYYYMMDDHHMMSS`
/// + milliseconds.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use till_core::generate_receipt_number;
///
/// let at = Utc.with_ymd_and_hms(2026, 10, 19, 14, 30, 5).unwrap()
///     + chrono::Duration::milliseconds(123);
/// assert_eq!(generate_receipt_number(at), "R20261019143005123");
/// ```
pub fn generate_receipt_number(now: DateTime<Utc>) -> String {
    format!(
        "R{}{:03}",
        now.format("%Y%m%d%H%M%S"),
        now.timestamp_subsec_millis() % 1000
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn product(id: i64, barcode: &str, price_cents: i64) -> Product {
        Product {
            id,
            barcode: barcode.to_string(),
            name: format!("Product {}", id),
            sale_price_cents: price_cents,
            quantity: 10,
            min_stock_threshold: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn units(n: i64) -> Quantity {
        Quantity::from_units(n)
    }

    fn building_order() -> Order {
        let mut order = Order::new(TaxRate::from_bps(1500));
        order.add_item(&product(1, "111", 10000), units(1)).unwrap();
        order
    }

    #[test]
    fn test_new_order_is_empty_with_tax_on() {
        let order = Order::new(TaxRate::default());
        assert_eq!(order.state(), OrderState::Empty);
        assert!(order.tax_enabled());
        assert!(order.is_empty());
    }

    #[test]
    fn test_same_barcode_merges() {
        let mut order = Order::new(TaxRate::default());
        let pen = product(7, "4006381333931", 250);

        order.add_item(&pen, units(2)).unwrap();
        let index = order.add_item(&pen, units(3)).unwrap();

        assert_eq!(index, 0);
        assert_eq!(order.line_count(), 1);
        assert_eq!(order.lines()[0].quantity, units(5));
        assert_eq!(order.state(), OrderState::Building);
    }

    #[test]
    fn test_price_is_snapshot_at_add_time() {
        let mut order = Order::new(TaxRate::default());
        let mut pen = product(7, "4006381333931", 250);
        order.add_item(&pen, units(1)).unwrap();

        pen.sale_price_cents = 400;
        pen.name = "Renamed".to_string();
        order.add_item(&pen, units(1)).unwrap();

        assert_eq!(order.lines()[0].unit_price, Money::from_cents(250));
        assert_eq!(order.lines()[0].description, "Product 7");
    }

    #[test]
    fn test_add_rejects_bad_quantity() {
        let mut order = Order::new(TaxRate::default());
        let pen = product(7, "1", 250);

        assert!(matches!(
            order.add_item(&pen, units(0)),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(order.add_item(&pen, units(-2)).is_err());
        assert_eq!(order.state(), OrderState::Empty);
    }

    #[test]
    fn test_merge_cannot_exceed_line_maximum() {
        let mut order = Order::new(TaxRate::default());
        let pen = product(7, "1", 250);
        order.add_item(&pen, units(crate::MAX_LINE_QUANTITY)).unwrap();

        assert!(order.add_item(&pen, units(1)).is_err());
        assert_eq!(order.lines()[0].quantity, units(crate::MAX_LINE_QUANTITY));
    }

    #[test]
    fn test_order_line_limit() {
        let mut order = Order::new(TaxRate::default());
        for i in 0..crate::MAX_ORDER_LINES as i64 {
            order.add_item(&product(i, &i.to_string(), 100), units(1)).unwrap();
        }

        let err = order.add_item(&product(999, "999", 100), units(1)).unwrap_err();
        assert!(matches!(err, CoreError::OrderTooLarge { max: 100 }));
    }

    #[test]
    fn test_set_quantity_zero_rejected() {
        let mut order = building_order();

        assert!(matches!(
            order.set_quantity(0, units(0)),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert_eq!(order.lines()[0].quantity, units(1));
    }

    #[test]
    fn test_set_quantity_unknown_line() {
        let mut order = building_order();
        assert!(matches!(
            order.set_quantity(3, units(2)),
            Err(CoreError::LineNotFound { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_removing_last_line_empties_order() {
        let mut order = building_order();
        order.add_item(&product(2, "222", 500), units(1)).unwrap();

        order.remove_item(0).unwrap();
        assert_eq!(order.state(), OrderState::Building);
        assert_eq!(order.lines()[0].barcode, "222");

        order.void_last_item().unwrap();
        assert_eq!(order.state(), OrderState::Empty);
        assert!(order.remove_item(0).is_err());
    }

    #[test]
    fn test_discounts_are_exclusive() {
        let mut order = building_order();

        order.set_percentage_discount(dec!(10)).unwrap();
        assert_eq!(order.discount_percentage(), dec!(10));

        order.set_fixed_discount(Money::from_cents(500)).unwrap();
        assert_eq!(order.discount_percentage(), Decimal::ZERO);
        assert_eq!(order.discount_amount(), Money::from_cents(500));

        order.set_percentage_discount(dec!(5)).unwrap();
        assert_eq!(order.discount_amount(), Money::zero());
    }

    #[test]
    fn test_discount_out_of_range_leaves_order_unchanged() {
        let mut order = building_order();
        order.set_percentage_discount(dec!(20)).unwrap();

        assert!(order.set_percentage_discount(dec!(120)).is_err());
        assert!(order.set_fixed_discount(Money::from_cents(-1)).is_err());
        assert_eq!(order.discount(), Discount::Percentage(dec!(20)));
    }

    #[test]
    fn test_reference_totals() {
        // subtotal 100.00, discount 10.00, tax 15%
        let mut order = building_order();
        order.set_fixed_discount(Money::from_cents(1000)).unwrap();

        let totals = order.totals();
        assert_eq!(totals.taxable, dec!(90.00));
        assert_eq!(totals.tax, dec!(13.50));
        assert_eq!(totals.total, dec!(103.50));

        order.set_tax_enabled(false).unwrap();
        assert_eq!(order.totals().total, dec!(90.00));
    }

    #[test]
    fn test_subtotal_never_drifts() {
        let mut order = Order::new(TaxRate::default());
        let a = product(1, "A", 199);
        let b = product(2, "B", 1049);
        let c = product(3, "C", 333);

        order.add_item(&a, units(3)).unwrap();
        order.add_item(&b, Quantity::from_hundredths(125)).unwrap();
        order.add_item(&c, units(2)).unwrap();
        order.set_quantity(0, units(7)).unwrap();
        order.add_item(&a, units(1)).unwrap();
        order.remove_item(1).unwrap();
        order.add_item(&b, Quantity::from_hundredths(50)).unwrap();
        order.set_quantity(1, Quantity::from_hundredths(275)).unwrap();

        let expected: Decimal = order
            .lines()
            .iter()
            .map(|l| l.quantity.to_decimal() * l.unit_price.to_decimal())
            .sum();
        assert_eq!(order.totals().subtotal, expected);
        // 8 × 1.99 + 2.75 × 3.33 + 0.5 × 10.49
        assert_eq!(expected, dec!(30.3225));
    }

    #[test]
    fn test_serialized_totals_match_recomputation() {
        let mut order = building_order();
        order.add_item(&product(2, "222", 333), Quantity::from_hundredths(150)).unwrap();
        order.set_percentage_discount(dec!(12.5)).unwrap();

        let json = serde_json::to_string(&order.totals()).unwrap();
        let restored: Totals = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, order.totals());

        let copy: Order = serde_json::from_str(&serde_json::to_string(&order).unwrap()).unwrap();
        assert_eq!(copy.totals(), order.totals());
    }

    #[test]
    fn test_begin_payment_requires_lines() {
        let mut order = Order::new(TaxRate::default());
        assert!(matches!(
            order.begin_payment(Money::from_cents(100)),
            Err(CoreError::EmptyOrder)
        ));
    }

    #[test]
    fn test_partial_payment_is_flagged_not_rejected() {
        let mut order = building_order();
        order.set_tax_enabled(false).unwrap();

        let status = order.begin_payment(Money::from_cents(6000)).unwrap();

        assert_eq!(order.state(), OrderState::AwaitingPayment);
        assert!(status.shortfall.is_some());
        assert_eq!(status.shortfall, Some(Money::from_cents(4000)));
        assert_eq!(status.change, Money::zero());
    }

    #[test]
    fn test_payment_change() {
        let mut order = building_order();
        let status = order.begin_payment(Money::from_cents(12000)).unwrap();

        assert_eq!(status.total, Money::from_cents(11500));
        assert_eq!(status.change, Money::from_cents(500));
        assert!(status.shortfall.is_none());
    }

    #[test]
    fn test_negative_payment_rejected() {
        let mut order = building_order();
        assert!(matches!(
            order.begin_payment(Money::from_cents(-1)),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert_eq!(order.state(), OrderState::Building);
    }

    #[test]
    fn test_order_frozen_while_awaiting_payment() {
        let mut order = building_order();
        order.begin_payment(Money::from_cents(20000)).unwrap();

        assert!(order.add_item(&product(2, "222", 100), units(1)).is_err());
        assert!(order.set_quantity(0, units(2)).is_err());
        assert!(order.set_percentage_discount(dec!(10)).is_err());
        assert!(order.set_tax_enabled(false).is_err());

        order.abort_payment().unwrap();
        assert_eq!(order.state(), OrderState::Building);
        assert_eq!(order.payment(), None);
        order.set_quantity(0, units(2)).unwrap();
    }

    #[test]
    fn test_prepare_commit_snapshot() {
        let mut order = building_order();
        order.add_item(&product(2, "222", 333), Quantity::from_hundredths(150)).unwrap();
        order
            .attach_customer(CustomerRef {
                id: 9,
                name: "Bilal".to_string(),
            })
            .unwrap();
        order.begin_payment(Money::from_cents(20000)).unwrap();

        let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let draft = order.prepare_commit(at).unwrap();

        assert_eq!(draft.receipt_number, "R20261019090000000");
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.lines[1].total_price, Money::from_cents(500));
        assert_eq!(draft.lines[1].stock_units, 2);
        assert_eq!(draft.customer.as_ref().map(|c| c.id), Some(9));
        assert_eq!(draft.payment, Money::from_cents(20000));
        // preparing does not commit
        assert_eq!(order.state(), OrderState::AwaitingPayment);
    }

    #[test]
    fn test_double_commit_rejected() {
        let mut order = building_order();
        order.begin_payment(Money::from_cents(20000)).unwrap();
        order.prepare_commit(Utc::now()).unwrap();
        order.mark_committed().unwrap();

        let err = order.prepare_commit(Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidState {
                state: OrderState::Committed,
                ..
            }
        ));
        assert!(order.mark_committed().is_err());
        assert!(order.cancel().is_err());
    }

    #[test]
    fn test_cancel_resets_everything() {
        let mut order = Order::with_tax_default(TaxRate::default(), true);
        order.add_item(&product(1, "111", 100), units(2)).unwrap();
        order.set_fixed_discount(Money::from_cents(50)).unwrap();
        order.set_tax_enabled(false).unwrap();
        order
            .attach_customer(CustomerRef {
                id: 1,
                name: "Walk-in".to_string(),
            })
            .unwrap();
        order.begin_payment(Money::from_cents(100)).unwrap();

        order.cancel().unwrap();

        assert_eq!(order.state(), OrderState::Empty);
        assert!(order.is_empty());
        assert_eq!(order.discount(), Discount::None);
        assert!(order.tax_enabled());
        assert!(order.customer().is_none());
        assert!(order.payment().is_none());
    }

    #[test]
    fn test_summary_serializes() {
        let mut order = building_order();
        order.set_fixed_discount(Money::from_cents(1000)).unwrap();

        let summary = order.summary().unwrap();
        assert_eq!(summary.totals.total, Money::from_cents(10350));
        assert_eq!(summary.lines[0].line_total, Money::from_cents(10000));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["state"], "building");
        assert_eq!(json["totals"]["total"], 10350);
    }
}
