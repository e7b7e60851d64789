//! # Domain Types
//!
//! Persisted records used throughout Till POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Product      │   │      Sale       │   │  InventoryMovement  │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (i64)       │   │  id (i64)       │   │  product_id         │   │
//! │  │  barcode (uniq) │   │  receipt_number │   │  movement_type      │   │
//! │  │  sale_price     │   │  totals (cents) │   │  old → new qty      │   │
//! │  │  quantity       │   │  customer ref   │   │  reason             │   │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────────┘   │
//! │                                 │ 1..n                                  │
//! │  ┌─────────────────┐   ┌────────▼────────┐   ┌─────────────────────┐   │
//! │  │    Customer     │   │    SaleLine     │   │ CustomerTransaction │   │
//! │  │  current_balance│   │  name snapshot  │   │  SALE / PAYMENT /   │   │
//! │  │  total_purchases│   │  price snapshot │   │  CREDIT / DEBIT     │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are integer cents with a `_cents` suffix; accessor
//! methods hand out [`Money`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1500 bps = 15%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as an exact decimal fraction (1500 bps → 0.15).
    #[inline]
    pub fn as_fraction(&self) -> rust_decimal::Decimal {
        rust_decimal::Decimal::new(i64::from(self.0), 4)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Read-only to the order engine, except `quantity`, which only the
/// inventory ledger writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,

    /// Scan code; unique across the catalog and the merge key for order lines.
    pub barcode: String,

    /// Display name, snapshotted onto order lines.
    pub name: String,

    /// Unit price in cents.
    pub sale_price_cents: i64,

    /// Stock on hand in whole units.
    pub quantity: i64,

    /// Low-stock warning level.
    pub min_stock_threshold: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Checks if stock is at or below the warning level.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock_threshold
    }
}

/// Input for creating a catalog product (used by the seeder and tests;
/// catalog management screens live outside this workspace).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub barcode: String,
    pub name: String,
    pub sale_price_cents: i64,
    pub quantity: i64,
    pub min_stock_threshold: i64,
}

// =============================================================================
// Customer
// =============================================================================

/// Customer pricing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum CustomerType {
    #[default]
    Regular,
    #[serde(rename = "VIP")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "VIP"))]
    Vip,
    Wholesale,
}

/// A customer account with a running balance.
///
/// ## Balance Sign
/// `current_balance_cents > 0` means the customer owes the store;
/// `< 0` means the store owes the customer (credit on account).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub contact_number: Option<String>,
    pub cnic_tax_id: Option<String>,
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub credit_limit_cents: i64,
    pub current_balance_cents: i64,
    pub customer_type: CustomerType,
    /// Informational default; never applied to an order automatically.
    pub discount_percentage: f64,
    pub total_purchases_cents: i64,
    pub last_purchase_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_date: DateTime<Utc>,
}

impl Customer {
    /// Returns the current balance as Money.
    #[inline]
    pub fn current_balance(&self) -> Money {
        Money::from_cents(self.current_balance_cents)
    }

    /// Returns the credit limit as Money.
    #[inline]
    pub fn credit_limit(&self) -> Money {
        Money::from_cents(self.credit_limit_cents)
    }

    /// Returns cumulative purchases as Money.
    #[inline]
    pub fn total_purchases(&self) -> Money {
        Money::from_cents(self.total_purchases_cents)
    }

    /// Checks if the balance exceeds a configured (non-zero) credit limit.
    ///
    /// Informational only: checkout does not enforce credit limits.
    pub fn is_over_credit_limit(&self) -> bool {
        self.credit_limit_cents > 0 && self.current_balance_cents > self.credit_limit_cents
    }
}

/// Input for creating a customer account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub contact_number: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub credit_limit_cents: i64,
    pub customer_type: CustomerType,
    pub discount_percentage: f64,
}

// =============================================================================
// Customer Transaction
// =============================================================================

/// Kind of customer ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Checkout charged to the account.
    Sale,
    /// Customer paid money in.
    Payment,
    /// Store reduced what the customer owes.
    Credit,
    /// Manual charge to the account.
    Debit,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Sale => "SALE",
            TransactionType::Payment => "PAYMENT",
            TransactionType::Credit => "CREDIT",
            TransactionType::Debit => "DEBIT",
        };
        f.write_str(s)
    }
}

/// One append-only customer ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerTransaction {
    pub id: i64,
    pub customer_id: i64,
    pub transaction_type: TransactionType,
    /// Always positive; direction comes from `transaction_type`.
    pub amount_cents: i64,
    pub description: Option<String>,
    pub reference_number: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub created_by: String,
}

impl CustomerTransaction {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Adjustment => "ADJUSTMENT",
        };
        f.write_str(s)
    }
}

/// One append-only stock movement row with before/after snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryMovement {
    pub id: i64,
    pub product_id: i64,
    pub movement_type: MovementType,
    /// Signed: negative for OUT.
    pub quantity_change: i64,
    pub old_quantity: i64,
    pub new_quantity: i64,
    pub reason: String,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub movement_date: DateTime<Utc>,
    pub created_by: String,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale header. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub receipt_number: String,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_cents: i64,
    pub change_cents: i64,
    pub sale_date: DateTime<Utc>,
    pub cashier: String,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the change handed back as Money.
    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }

    /// Checks if the customer tendered less than the total.
    #[inline]
    pub fn is_partial_payment(&self) -> bool {
        self.payment_cents < self.total_cents
    }
}

/// A persisted sale line. Name and price are snapshots from add-time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity_hundredths: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tax_rate_fraction() {
        assert_eq!(TaxRate::from_bps(1500).as_fraction(), dec!(0.15));
        assert_eq!(TaxRate::from_bps(825).as_fraction(), dec!(0.0825));
        assert_eq!(TaxRate::default().bps(), 1500);
    }

    #[test]
    fn test_credit_limit_is_informational() {
        let mut customer = Customer {
            id: 1,
            name: "Ayesha Traders".to_string(),
            contact_number: None,
            cnic_tax_id: None,
            company_name: None,
            address: None,
            email: None,
            credit_limit_cents: 0,
            current_balance_cents: 90_000,
            customer_type: CustomerType::Wholesale,
            discount_percentage: 5.0,
            total_purchases_cents: 0,
            last_purchase_date: None,
            notes: None,
            created_date: Utc::now(),
        };

        // No limit configured
        assert!(!customer.is_over_credit_limit());

        customer.credit_limit_cents = 50_000;
        assert!(customer.is_over_credit_limit());
    }

    #[test]
    fn test_enum_serialization_matches_storage_values() {
        assert_eq!(serde_json::to_string(&CustomerType::Vip).unwrap(), "\"VIP\"");
        assert_eq!(serde_json::to_string(&MovementType::Adjustment).unwrap(), "\"ADJUSTMENT\"");
        assert_eq!(serde_json::to_string(&TransactionType::Payment).unwrap(), "\"PAYMENT\"");
        assert_eq!(TransactionType::Sale.to_string(), "SALE");
        assert_eq!(MovementType::Out.to_string(), "OUT");
    }
}
