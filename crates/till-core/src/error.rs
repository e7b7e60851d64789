//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Order/ledger rule violations                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  ├── DbError          - Storage failures, conflicts, lookups           │
//! │  └── CheckoutError    - Commit failures (wraps the two above)          │
//! │                                                                         │
//! │  Terminal errors (in app)                                              │
//! │  └── TerminalError    - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → TerminalError     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is raised *before* any state changes, so the order
//! or ledger is exactly as it was when the call was made.

use thiserror::Error;

use crate::order::OrderState;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Quantity is zero, negative, too precise, or above the line maximum.
    ///
    /// ## When This Occurs
    /// - `add_item` with qty ≤ 0
    /// - `set_quantity(line, 0)` (use `remove_item` instead)
    /// - A quantity with more than two decimal places
    #[error("Invalid quantity {quantity}: {reason}")]
    InvalidQuantity { quantity: String, reason: String },

    /// The operation is not allowed in the order's current state.
    ///
    /// ## Example
    /// ```text
    /// commit() ──► Committed
    /// commit() ──► InvalidState { operation: "commit", state: Committed }
    /// ```
    #[error("Cannot {operation} while order is {state}")]
    InvalidState {
        operation: &'static str,
        state: OrderState,
    },

    /// Line index does not exist in the order.
    #[error("Order has no line {index} (lines: {len})")]
    LineNotFound { index: usize, len: usize },

    /// Monetary amount is invalid for the operation (negative payment,
    /// zero ledger posting).
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: String, reason: String },

    /// Order has no lines.
    #[error("Order has no items")]
    EmptyOrder,

    /// Order already holds the maximum number of distinct lines.
    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    /// A decimal value does not fit in the integer storage representation.
    #[error("Amount out of range: {0}")]
    Overflow(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidState error.
    pub fn invalid_state(operation: &'static str, state: OrderState) -> Self {
        CoreError::InvalidState { operation, state }
    }

    /// Creates an InvalidQuantity error.
    pub fn invalid_quantity(quantity: impl ToString, reason: impl Into<String>) -> Self {
        CoreError::InvalidQuantity {
            quantity: quantity.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an InvalidAmount error.
    pub fn invalid_amount(amount: impl ToString, reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            amount: amount.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., barcode with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Creates an OutOfRange error from any displayable bounds.
    pub fn out_of_range(field: &str, min: impl ToString, max: impl ToString) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::invalid_state("commit", OrderState::Committed);
        assert_eq!(err.to_string(), "Cannot commit while order is committed");

        let err = CoreError::LineNotFound { index: 4, len: 2 };
        assert_eq!(err.to_string(), "Order has no line 4 (lines: 2)");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "reason".to_string(),
        };
        assert_eq!(err.to_string(), "reason is required");

        let err = ValidationError::out_of_range("discount percentage", 0, 100);
        assert_eq!(err.to_string(), "discount percentage must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
