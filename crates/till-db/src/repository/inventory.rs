//! # Inventory Repository (Inventory Ledger)
//!
//! Applies stock changes and appends the matching `stock_movements` row.
//!
//! ## Apply Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply(StockAdjustment)                                                │
//! │       │                                                                 │
//! │       ├── validate change + reason            (nothing read yet)       │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │       ├── SELECT quantity FROM products       → NotFound if missing    │
//! │       ├── StockChange::plan(current)          (till-core, pure)        │
//! │       ├── UPDATE products SET quantity = new                           │
//! │       └── INSERT INTO stock_movements (old, change, new, reason ...)   │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkout runs the same steps through [`apply_in`] on its own
//! transaction, so a sale's movements commit or roll back with the sale.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product;
use till_core::validation::validate_reason;
use till_core::{CoreError, InventoryMovement, StockChange, DEFAULT_OPERATOR};

const MOVEMENT_COLUMNS: &str = "id, product_id, movement_type, quantity_change, old_quantity, \
                                new_quantity, reason, reference_number, notes, movement_date, \
                                created_by";

/// A request to change one product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: i64,
    pub change: StockChange,
    pub reason: String,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    /// Operator name; `POS User` when not given.
    pub created_by: Option<String>,
}

impl StockAdjustment {
    /// Creates an adjustment with no reference, notes or operator.
    pub fn new(product_id: i64, change: StockChange, reason: impl Into<String>) -> Self {
        StockAdjustment {
            product_id,
            change,
            reason: reason.into(),
            reference_number: None,
            notes: None,
            created_by: None,
        }
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_number = Some(reference.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn created_by(mut self, operator: impl Into<String>) -> Self {
        self.created_by = Some(operator.into());
        self
    }
}

/// Filter for [`InventoryRepository::history`]. Dates are inclusive UTC days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Repository for stock movements.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Applies a stock change and records the movement.
    ///
    /// ## Returns
    /// The appended movement; `new_quantity` is the product's stock now.
    ///
    /// ## Errors
    /// * `DbError::Rejected` - Empty reason or invalid quantity
    /// * `DbError::NotFound` - Unknown product id
    pub async fn apply(&self, adjustment: &StockAdjustment) -> DbResult<InventoryMovement> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let movement = apply_in(&mut tx, adjustment, Utc::now()).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            product_id = movement.product_id,
            movement_type = %movement.movement_type,
            change = movement.quantity_change,
            new_quantity = movement.new_quantity,
            "Stock movement recorded"
        );
        Ok(movement)
    }

    /// Movement history, newest first.
    pub async fn history(&self, filter: &MovementFilter) -> DbResult<Vec<InventoryMovement>> {
        debug!(?filter, "Loading stock history");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM stock_movements WHERE 1=1",
            MOVEMENT_COLUMNS
        ));

        if let Some(product_id) = filter.product_id {
            query.push(" AND product_id = ").push_bind(product_id);
        }
        if let Some(from) = filter.from {
            query.push(" AND movement_date >= ").push_bind(start_of_day(from));
        }
        if let Some(to) = filter.to {
            // inclusive: everything before the following midnight
            let end = to.checked_add_days(Days::new(1)).unwrap_or(to);
            query.push(" AND movement_date < ").push_bind(start_of_day(end));
        }
        query.push(" ORDER BY movement_date DESC, id DESC");

        let movements = query
            .build_query_as::<InventoryMovement>()
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }
}

/// Applies one stock change on an open connection or transaction.
pub(crate) async fn apply_in(
    conn: &mut SqliteConnection,
    adjustment: &StockAdjustment,
    at: DateTime<Utc>,
) -> DbResult<InventoryMovement> {
    adjustment.change.validate()?;
    let reason = validate_reason(&adjustment.reason).map_err(CoreError::from)?;

    let current = product::fetch_by_id(&mut *conn, adjustment.product_id)
        .await?
        .ok_or_else(|| DbError::not_found("Product", adjustment.product_id))?
        .quantity;

    let plan = adjustment.change.plan(current)?;
    if plan.goes_negative() {
        warn!(
            product_id = adjustment.product_id,
            new_quantity = plan.new_quantity,
            "Stock is now negative"
        );
    }

    product::write_quantity(&mut *conn, adjustment.product_id, plan.new_quantity).await?;

    let created_by = adjustment
        .created_by
        .clone()
        .unwrap_or_else(|| DEFAULT_OPERATOR.to_string());

    let result = sqlx::query(
        r#"
        INSERT INTO stock_movements (
            product_id, movement_type, quantity_change, old_quantity, new_quantity,
            reason, reference_number, notes, movement_date, created_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(adjustment.product_id)
    .bind(plan.movement_type)
    .bind(plan.quantity_change)
    .bind(plan.old_quantity)
    .bind(plan.new_quantity)
    .bind(&reason)
    .bind(&adjustment.reference_number)
    .bind(&adjustment.notes)
    .bind(at)
    .bind(&created_by)
    .execute(&mut *conn)
    .await?;

    Ok(InventoryMovement {
        id: result.last_insert_rowid(),
        product_id: adjustment.product_id,
        movement_type: plan.movement_type,
        quantity_change: plan.quantity_change,
        old_quantity: plan.old_quantity,
        new_quantity: plan.new_quantity,
        reason,
        reference_number: adjustment.reference_number.clone(),
        notes: adjustment.notes.clone(),
        movement_date: at,
        created_by,
    })
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use till_core::{MovementType, NewProduct};

    async fn db_with_product(quantity: i64) -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&NewProduct {
                barcode: "8964000123456".to_string(),
                name: "Olpers Milk 1L".to_string(),
                sale_price_cents: 28000,
                quantity,
                min_stock_threshold: 2,
            })
            .await
            .unwrap();
        (db, product.id)
    }

    async fn stock_of(db: &Database, id: i64) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_stock_in_updates_product() {
        let (db, id) = db_with_product(10).await;

        let movement = db
            .inventory()
            .apply(&StockAdjustment::new(id, StockChange::StockIn(5), "Delivery").reference("PO-17"))
            .await
            .unwrap();

        assert_eq!(movement.movement_type, MovementType::In);
        assert_eq!(movement.old_quantity, 10);
        assert_eq!(movement.new_quantity, 15);
        assert_eq!(movement.created_by, "POS User");
        assert_eq!(stock_of(&db, id).await, 15);
    }

    #[tokio::test]
    async fn test_manual_stock_out_floors_at_zero() {
        let (db, id) = db_with_product(3).await;

        let movement = db
            .inventory()
            .apply(&StockAdjustment::new(id, StockChange::StockOut(8), "Expired"))
            .await
            .unwrap();

        assert_eq!(movement.new_quantity, 0);
        assert_eq!(stock_of(&db, id).await, 0);
    }

    #[tokio::test]
    async fn test_adjustment_sets_target() {
        let (db, id) = db_with_product(10).await;

        let movement = db
            .inventory()
            .apply(
                &StockAdjustment::new(id, StockChange::SetTo(4), "Stock count")
                    .notes("shelf recount")
                    .created_by("Sana"),
            )
            .await
            .unwrap();

        assert_eq!(movement.movement_type, MovementType::Adjustment);
        assert_eq!(movement.quantity_change, -6);
        assert_eq!(movement.created_by, "Sana");
        assert_eq!(stock_of(&db, id).await, 4);
    }

    #[tokio::test]
    async fn test_reason_required() {
        let (db, id) = db_with_product(10).await;

        let err = db
            .inventory()
            .apply(&StockAdjustment::new(id, StockChange::StockIn(1), "  "))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Rejected(CoreError::Validation(_))));
        assert_eq!(stock_of(&db, id).await, 10);
        assert!(db.inventory().history(&MovementFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let (db, _) = db_with_product(10).await;

        let err = db
            .inventory()
            .apply(&StockAdjustment::new(999, StockChange::StockIn(1), "Delivery"))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_history_newest_first_with_filters() {
        let (db, id) = db_with_product(10).await;
        let other = db
            .products()
            .insert(&NewProduct {
                barcode: "5000112637922".to_string(),
                name: "Coca-Cola 330ml".to_string(),
                sale_price_cents: 12000,
                quantity: 1,
                min_stock_threshold: 0,
            })
            .await
            .unwrap();

        let inventory = db.inventory();
        inventory
            .apply(&StockAdjustment::new(id, StockChange::StockIn(2), "Delivery"))
            .await
            .unwrap();
        inventory
            .apply(&StockAdjustment::new(other.id, StockChange::StockIn(1), "Delivery"))
            .await
            .unwrap();
        inventory
            .apply(&StockAdjustment::new(id, StockChange::StockOut(1), "Damaged"))
            .await
            .unwrap();

        let all = inventory.history(&MovementFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].reason, "Damaged");

        let mine = inventory
            .history(&MovementFilter {
                product_id: Some(id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[1].reason, "Delivery");

        let today = Utc::now().date_naive();
        let in_range = inventory
            .history(&MovementFilter {
                product_id: None,
                from: Some(today),
                to: Some(today),
            })
            .await
            .unwrap();
        assert_eq!(in_range.len(), 3);

        let yesterday = today.pred_opt().unwrap();
        let none = inventory
            .history(&MovementFilter {
                product_id: None,
                from: None,
                to: Some(yesterday),
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
