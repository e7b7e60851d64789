//! # Validation Module
//!
//! Input validation utilities for Till POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal command parser                                      │
//! │  ├── Tokenizing, number parsing                                        │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Order / ledger operations (Rust)                             │
//! │  └── THIS MODULE: Business rule validation, before any mutation        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (barcode, receipt number)                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_barcode, validate_reason};
//!
//! validate_barcode("4006381333931").unwrap();
//! assert!(validate_reason("   ").is_err());
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::MAX_ORDER_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a barcode (scan code).
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - No whitespace inside the code
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_barcode;
///
/// assert!(validate_barcode("8964000123456").is_ok());
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("89640 00123").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 64,
        });
    }

    if barcode.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a customer name.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates the reason on a stock movement.
///
/// Every movement must say why it happened; the inventory screen refuses
/// to save an adjustment without one.
///
/// ## Returns
/// The trimmed reason.
pub fn validate_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 500,
        });
    }

    Ok(reason.to_string())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns the first page by name)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a percentage discount.
///
/// ## Rules
/// - Between 0 and 100 inclusive (0 clears the discount)
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use till_core::validation::validate_discount_percentage;
///
/// assert!(validate_discount_percentage(Decimal::from(10)).is_ok());
/// assert!(validate_discount_percentage(Decimal::from(101)).is_err());
/// ```
pub fn validate_discount_percentage(pct: Decimal) -> ValidationResult<()> {
    if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(ValidationError::out_of_range("discount percentage", 0, 100));
    }

    Ok(())
}

/// Validates a fixed discount in cents.
///
/// ## Rules
/// - Must be non-negative (0 clears the discount)
pub fn validate_discount_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::out_of_range("discount amount", 0, i64::MAX));
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());  // 10.99
/// assert!(validate_price_cents(0).is_ok());     // Free item
/// assert!(validate_price_cents(-100).is_err()); // Invalid
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::out_of_range("price", 0, i64::MAX));
    }

    Ok(())
}

/// Validates a tendered amount in cents.
///
/// ## Rules
/// - Must be non-negative; zero is a legal (fully on-account) tender
pub fn validate_tender_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::out_of_range("payment amount", 0, i64::MAX));
    }

    Ok(())
}

/// Validates a ledger posting amount in cents.
///
/// ## Rules
/// - Must be positive (> 0); direction comes from the transaction type
pub fn validate_posting_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock quantity argument (units in/out).
pub fn validate_stock_units(units: i64) -> ValidationResult<()> {
    if units <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a target stock level for an adjustment.
pub fn validate_stock_target(target: i64) -> ValidationResult<()> {
    if target < 0 {
        return Err(ValidationError::out_of_range("target quantity", 0, i64::MAX));
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::out_of_range("tax_rate", 0, 10000));
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates order size before a new line is appended.
///
/// ## Rules
/// - Must not exceed MAX_ORDER_LINES (100)
pub fn validate_order_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_ORDER_LINES {
        return Err(ValidationError::out_of_range("order lines", 0, MAX_ORDER_LINES));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
