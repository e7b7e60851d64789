//! # Checkout Commit
//!
//! Turns an order awaiting payment into a persisted sale and applies its
//! stock and customer effects in one SQLite transaction.
//!
//! ## Commit Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order (AwaitingPayment)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  prepare_commit(now) ──► SaleDraft { receipt_number, totals, lines }   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │   ├── for each line: SaleOut(stock_units)   OUT movement, no floor     │
//! │   ├── INSERT sales + sale_items                                        │
//! │   └── customer attached and total > 0:                                 │
//! │         SALE posting "POS Sale - {n} items", ref = receipt number      │
//! │  COMMIT ──► order.mark_committed()                                     │
//! │                                                                         │
//! │  Any failure ──► ROLLBACK, CommitFailed, order stays AwaitingPayment   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::error::{CheckoutError, CheckoutResult, DbError, DbResult};
use crate::repository::customer::{self, Posting};
use crate::repository::inventory::{self, StockAdjustment};
use crate::repository::sale;
use till_core::account::sale_description;
use till_core::{Order, Sale, SaleDraft, SaleLine, StockChange, TransactionType};

/// Reason recorded on stock movements written by checkout.
pub const SALE_MOVEMENT_REASON: &str = "Sale";

/// A sale as it was persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommittedSale {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

/// Commits orders against the database.
#[derive(Debug, Clone)]
pub struct Checkout {
    pool: SqlitePool,
}

impl Checkout {
    /// Creates a new Checkout.
    pub fn new(pool: SqlitePool) -> Self {
        Checkout { pool }
    }

    /// Persists the order and marks it `Committed`.
    ///
    /// ## Errors
    /// * `CheckoutError::Order` - Order is not awaiting payment (includes a
    ///   second commit of the same order). Nothing is written.
    /// * `CheckoutError::CommitFailed` - A step failed; the transaction was
    ///   rolled back and the order is still `AwaitingPayment`.
    pub async fn commit(&self, order: &mut Order, cashier: &str) -> CheckoutResult<CommittedSale> {
        let draft = order.prepare_commit(Utc::now())?;
        let receipt_number = draft.receipt_number.clone();

        info!(
            receipt_number = %receipt_number,
            lines = draft.lines.len(),
            total = %draft.totals.total,
            customer_id = ?draft.customer.as_ref().map(|c| c.id),
            "Committing order"
        );

        match self.write(&draft, cashier).await {
            Ok(committed) => {
                order.mark_committed()?;
                info!(
                    receipt_number = %receipt_number,
                    sale_id = committed.sale.id,
                    "Sale committed"
                );
                Ok(committed)
            }
            Err(source) => {
                error!(
                    receipt_number = %receipt_number,
                    error = %source,
                    "Commit failed, rolled back"
                );
                Err(CheckoutError::CommitFailed {
                    receipt_number,
                    source,
                })
            }
        }
    }

    async fn write(&self, draft: &SaleDraft, cashier: &str) -> DbResult<CommittedSale> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for line in &draft.lines {
            let adjustment = StockAdjustment::new(
                line.product_id,
                StockChange::SaleOut(line.stock_units),
                SALE_MOVEMENT_REASON,
            )
            .reference(draft.receipt_number.clone())
            .created_by(cashier);

            inventory::apply_in(&mut tx, &adjustment, draft.sale_date).await?;
        }

        let (sale, lines) = sale::insert_in(&mut tx, draft, cashier).await?;

        if let Some(customer) = &draft.customer {
            if draft.totals.total.is_positive() {
                let posting = Posting::new(customer.id, TransactionType::Sale, draft.totals.total)
                    .description(sale_description(draft.item_count()))
                    .reference(draft.receipt_number.clone())
                    .created_by(cashier);

                customer::post_in(&mut tx, &posting, draft.sale_date).await?;
            } else {
                warn!(
                    receipt_number = %draft.receipt_number,
                    customer_id = customer.id,
                    "Zero total, customer posting skipped"
                );
            }
        }

        // dropping `tx` on any early return above rolls back
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(CommittedSale { sale, lines })
    }
}
