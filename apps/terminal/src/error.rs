//! # Terminal Error Type
//!
//! Every failed command becomes one `TerminalError`, printed as JSON so a
//! front end (or a test harness) can branch on the code.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError ─────────┐                                                  │
//! │  DbError ───────────┼──► TerminalError { code, message } ──► stdout    │
//! │  CheckoutError ─────┤                                                  │
//! │  ConfigError ───────┘                                                  │
//! │                                                                         │
//! │  { "code": "INVALID_STATE",                                            │
//! │    "message": "Cannot add item while order is awaiting payment" }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are logged in full and reported with a generic message.

use serde::Serialize;
use till_core::CoreError;
use till_db::{CheckoutError, DbError};

use crate::config::ConfigError;

/// Error reported for a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, customer, line or receipt does not exist
    NotFound,

    /// Bad input, rejected before anything changed
    ValidationError,

    /// Operation not allowed in the order's current state
    InvalidState,

    /// Duplicate barcode or receipt number
    Conflict,

    /// The database failed
    StorageError,

    /// Checkout transaction rolled back
    CommitFailed,

    /// Lookup failed while building the order
    CatalogUnavailable,

    /// Bad configuration
    ConfigError,

    /// Unparseable command line
    UnknownCommand,
}

impl TerminalError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        TerminalError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        TerminalError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        TerminalError::new(ErrorCode::ValidationError, message)
    }

    pub fn unknown_command(message: impl Into<String>) -> Self {
        TerminalError::new(ErrorCode::UnknownCommand, message)
    }
}

impl From<CoreError> for TerminalError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InvalidState { .. } | CoreError::EmptyOrder => ErrorCode::InvalidState,
            CoreError::LineNotFound { .. } => ErrorCode::NotFound,
            CoreError::InvalidQuantity { .. }
            | CoreError::InvalidAmount { .. }
            | CoreError::OrderTooLarge { .. }
            | CoreError::Overflow(_)
            | CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        TerminalError::new(code, err.to_string())
    }
}

impl From<DbError> for TerminalError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TerminalError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => TerminalError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Rejected(core) => core.into(),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                TerminalError::validation("Invalid reference")
            }
            other => {
                tracing::error!(error = %other, "Storage failure");
                TerminalError::new(ErrorCode::StorageError, "Database operation failed")
            }
        }
    }
}

impl From<CheckoutError> for TerminalError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Order(core) => core.into(),
            CheckoutError::CatalogUnavailable(source) => {
                tracing::error!(error = %source, "Catalog lookup failed");
                TerminalError::new(
                    ErrorCode::CatalogUnavailable,
                    "Catalog is unavailable, try again",
                )
            }
            err @ CheckoutError::CommitFailed { .. } => {
                TerminalError::new(ErrorCode::CommitFailed, err.to_string())
            }
        }
    }
}

impl From<ConfigError> for TerminalError {
    fn from(err: ConfigError) -> Self {
        TerminalError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for TerminalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for TerminalError {}

pub type TerminalResult<T> = Result<T, TerminalError>;
