//! # Sale Repository (Sale Recorder)
//!
//! Persists committed orders as a sale header plus one row per line.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales                                sale_items                       │
//! │  ┌──────────────────────────┐         ┌─────────────────────────────┐  │
//! │  │ id                       │◄────────│ sale_id                     │  │
//! │  │ receipt_number (UNIQUE)  │    1..n │ product_id, product_name    │  │
//! │  │ customer_id / name       │         │ quantity_hundredths         │  │
//! │  │ subtotal, discount, tax  │         │ unit_price, total_price     │  │
//! │  │ total, payment, change   │         └─────────────────────────────┘  │
//! │  │ sale_date, cashier       │                                          │
//! │  └──────────────────────────┘                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are written only through [`crate::checkout::Checkout`] so the
//! header, its lines, stock and the customer ledger land together.
//! Product name and price are copied onto each line; later catalog edits
//! do not rewrite history.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::{Sale, SaleDraft, SaleLine};

const SALE_COLUMNS: &str = "id, receipt_number, customer_id, customer_name, subtotal_cents, \
                            discount_cents, tax_cents, total_cents, payment_cents, change_cents, \
                            sale_date, cashier";

const LINE_COLUMNS: &str = "id, sale_id, product_id, product_name, quantity_hundredths, \
                            unit_price_cents, total_price_cents";

/// Read access to recorded sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale by its receipt number.
    pub async fn get_by_receipt(&self, receipt_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE receipt_number = ?1", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(receipt_number.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lines of a sale in the order they were rung up.
    pub async fn get_lines(&self, sale_id: i64) -> DbResult<Vec<SaleLine>> {
        let sql = format!(
            "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY id",
            LINE_COLUMNS
        );
        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Most recent sales, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales ORDER BY sale_date DESC, id DESC LIMIT ?1",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Counts recorded sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Writes the sale header and its lines on an open transaction.
pub(crate) async fn insert_in(
    conn: &mut SqliteConnection,
    draft: &SaleDraft,
    cashier: &str,
) -> DbResult<(Sale, Vec<SaleLine>)> {
    debug!(
        receipt_number = %draft.receipt_number,
        lines = draft.lines.len(),
        "Inserting sale"
    );

    let totals = &draft.totals;
    let customer_id = draft.customer.as_ref().map(|c| c.id);
    let customer_name = draft.customer.as_ref().map(|c| c.name.clone());

    let result = sqlx::query(
        r#"
        INSERT INTO sales (
            receipt_number, customer_id, customer_name,
            subtotal_cents, discount_cents, tax_cents, total_cents,
            payment_cents, change_cents, sale_date, cashier
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&draft.receipt_number)
    .bind(customer_id)
    .bind(&customer_name)
    .bind(totals.subtotal.cents())
    .bind(totals.discount.cents())
    .bind(totals.tax.cents())
    .bind(totals.total.cents())
    .bind(draft.payment.cents())
    .bind(totals.change.cents())
    .bind(draft.sale_date)
    .bind(cashier)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => {
            DbError::duplicate(field, draft.receipt_number.as_str())
        }
        other => other,
    })?;

    let sale_id = result.last_insert_rowid();

    let mut lines = Vec::with_capacity(draft.lines.len());
    for line in &draft.lines {
        let inserted = sqlx::query(
            r#"
            INSERT INTO sale_items (
                sale_id, product_id, product_name, quantity_hundredths,
                unit_price_cents, total_price_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(sale_id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.quantity.hundredths())
        .bind(line.unit_price.cents())
        .bind(line.total_price.cents())
        .execute(&mut *conn)
        .await?;

        lines.push(SaleLine {
            id: inserted.last_insert_rowid(),
            sale_id,
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity_hundredths: line.quantity.hundredths(),
            unit_price_cents: line.unit_price.cents(),
            total_price_cents: line.total_price.cents(),
        });
    }

    let sale = Sale {
        id: sale_id,
        receipt_number: draft.receipt_number.clone(),
        customer_id,
        customer_name,
        subtotal_cents: totals.subtotal.cents(),
        discount_cents: totals.discount.cents(),
        tax_cents: totals.tax.cents(),
        total_cents: totals.total.cents(),
        payment_cents: draft.payment.cents(),
        change_cents: totals.change.cents(),
        sale_date: draft.sale_date,
        cashier: cashier.to_string(),
    };

    Ok((sale, lines))
}
