//! # till-core: Pure Business Logic for Till POS
//!
//! This crate is the **heart** of Till POS: the checkout engine. It holds the
//! in-memory order, the pricing rules, and the bookkeeping rules that the
//! inventory and customer ledgers apply. Nothing in here touches a database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/terminal (CheckoutSession)                 │   │
//! │  │     scan ──► add ──► discount/tax ──► pay ──► commit            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  order  │ │ pricing │ │  stock  │ │ account │ │  types  │  │   │
//! │  │   │  Order  │ │ Totals  │ │  plan   │ │ balance │ │ Product │  │   │
//! │  │   │LineItem │ │ Rounded │ │movement │ │ running │ │Customer │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  till-db (Database Layer)                       │   │
//! │  │   catalog, inventory ledger, customer ledger, sales, checkout   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Persisted records (Product, Customer, Sale, movements, transactions)
//! - [`money`] - Integer-cent `Money` and the 2 dp rounding boundary
//! - [`quantity`] - Line-item quantities with up to two decimals
//! - [`order`] - The Order Engine state machine
//! - [`pricing`] - Subtotal/discount/tax/total/change derivation
//! - [`stock`] - Inventory movement planning (floors, adjustments)
//! - [`account`] - Customer balance effects and running history
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::{Money, Order, Quantity, TaxRate};
//! # use chrono::Utc;
//! # use till_core::Product;
//! # let product = Product {
//! #     id: 7, barcode: "4006381333931".into(), name: "Stabilo Pen".into(),
//! #     sale_price_cents: 2500, quantity: 10, min_stock_threshold: 2,
//! #     created_at: Utc::now(), updated_at: Utc::now(),
//! # };
//!
//! let mut order = Order::new(TaxRate::from_bps(1500));
//! order.add_item(&product, Quantity::from_units(4)).unwrap();
//! order.set_fixed_discount(Money::from_cents(1000)).unwrap();
//!
//! let totals = order.totals().rounded().unwrap();
//! assert_eq!(totals.subtotal.cents(), 10000);
//! assert_eq!(totals.tax.cents(), 1350);
//! assert_eq!(totals.total.cents(), 10350);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod quantity;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{
    generate_receipt_number, CustomerRef, Discount, LineItem, Order, OrderState, OrderSummary,
    PaymentStatus, SaleDraft, SaleLineDraft,
};
pub use pricing::{RoundedTotals, Totals};
pub use quantity::Quantity;
pub use stock::{MovementPlan, StockChange};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single line, in whole units.
///
/// Catches keypad slips (typing 10000 instead of 10.00).
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Default tax rate in basis points (15%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1500;

/// Operator recorded on movements and transactions when none is configured.
pub const DEFAULT_OPERATOR: &str = "POS User";
