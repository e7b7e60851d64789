//! # Customer Repository (Customer Ledger)
//!
//! Customer accounts and their append-only transaction history.
//!
//! ## Posting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  post_payment(id, 20.00, ...)                                          │
//! │       │                                                                 │
//! │       ├── balance_delta(PAYMENT, 20.00) = −20.00   (till-core)         │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │       ├── UPDATE customers SET current_balance_cents += delta          │
//! │       │       (SALE also bumps total_purchases, last_purchase_date)    │
//! │       │       0 rows → NotFound, nothing appended                      │
//! │       └── INSERT INTO customer_transactions                            │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `current_balance_cents` is the source of truth. The running balance in
//! [`CustomerRepository::running_history`] is for display only.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::escape_like;
use crate::error::{DbError, DbResult};
use till_core::account::{balance_delta, running_history, HistoryEntry};
use till_core::validation::{validate_customer_name, validate_search_query};
use till_core::{
    CoreError, Customer, CustomerTransaction, Money, NewCustomer, TransactionType,
    DEFAULT_OPERATOR,
};

const CUSTOMER_COLUMNS: &str = "id, name, contact_number, cnic_tax_id, company_name, address, \
                                email, credit_limit_cents, current_balance_cents, customer_type, \
                                discount_percentage, total_purchases_cents, last_purchase_date, \
                                notes, created_date";

const TRANSACTION_COLUMNS: &str = "id, customer_id, transaction_type, amount_cents, description, \
                                   reference_number, transaction_date, created_by";

/// Default number of rows in a customer's history view.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// One ledger posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub customer_id: i64,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub description: Option<String>,
    pub reference_number: Option<String>,
    pub created_by: Option<String>,
}

impl Posting {
    pub fn new(customer_id: i64, transaction_type: TransactionType, amount: Money) -> Self {
        Posting {
            customer_id,
            transaction_type,
            amount,
            description: None,
            reference_number: None,
            created_by: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_number = Some(reference.into());
        self
    }

    pub fn created_by(mut self, operator: impl Into<String>) -> Self {
        self.created_by = Some(operator.into());
        self
    }
}

/// Repository for customers and customer transactions.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Case-insensitive substring search over name, contact number and
    /// company, ordered by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let query = validate_search_query(query).map_err(CoreError::from)?;
        debug!(query = %query, limit = limit, "Searching customers");

        let pattern = format!("%{}%", escape_like(&query));
        let sql = format!(
            "SELECT {} FROM customers \
             WHERE name LIKE ?1 ESCAPE '\\' \
                OR contact_number LIKE ?1 ESCAPE '\\' \
                OR company_name LIKE ?1 ESCAPE '\\' \
             ORDER BY name LIMIT ?2",
            CUSTOMER_COLUMNS
        );

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(pattern)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Creates a customer account with a zero balance.
    pub async fn insert(&self, customer: &NewCustomer) -> DbResult<Customer> {
        validate_customer_name(&customer.name).map_err(CoreError::from)?;

        let result = sqlx::query(
            r#"
            INSERT INTO customers (
                name, contact_number, company_name, email, credit_limit_cents,
                customer_type, discount_percentage, created_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(customer.name.trim())
        .bind(&customer.contact_number)
        .bind(&customer.company_name)
        .bind(&customer.email)
        .bind(customer.credit_limit_cents)
        .bind(customer.customer_type)
        .bind(customer.discount_percentage)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(customer_id = id, name = %customer.name, "Customer created");

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Appends a posting and moves the balance in one transaction.
    pub async fn post(&self, posting: &Posting) -> DbResult<CustomerTransaction> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let row = post_in(&mut tx, posting, Utc::now()).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(row)
    }

    /// SALE: `balance += amount`, updates purchase stats.
    pub async fn post_sale(
        &self,
        customer_id: i64,
        amount: Money,
        reference: Option<&str>,
    ) -> DbResult<CustomerTransaction> {
        let mut posting = Posting::new(customer_id, TransactionType::Sale, amount);
        posting.reference_number = reference.map(str::to_string);
        self.post(&posting).await
    }

    /// PAYMENT: `balance -= amount`.
    pub async fn post_payment(
        &self,
        customer_id: i64,
        amount: Money,
        description: Option<&str>,
        reference: Option<&str>,
    ) -> DbResult<CustomerTransaction> {
        self.post(&posting_with(customer_id, TransactionType::Payment, amount, description, reference))
            .await
    }

    /// CREDIT: `balance -= amount` (reduces what the customer owes).
    pub async fn post_credit(
        &self,
        customer_id: i64,
        amount: Money,
        description: Option<&str>,
        reference: Option<&str>,
    ) -> DbResult<CustomerTransaction> {
        self.post(&posting_with(customer_id, TransactionType::Credit, amount, description, reference))
            .await
    }

    /// DEBIT: `balance += amount` (manual charge).
    pub async fn post_debit(
        &self,
        customer_id: i64,
        amount: Money,
        description: Option<&str>,
        reference: Option<&str>,
    ) -> DbResult<CustomerTransaction> {
        self.post(&posting_with(customer_id, TransactionType::Debit, amount, description, reference))
            .await
    }

    /// Latest transactions for a customer, newest first.
    pub async fn transactions(&self, customer_id: i64, limit: u32) -> DbResult<Vec<CustomerTransaction>> {
        let sql = format!(
            "SELECT {} FROM customer_transactions WHERE customer_id = ?1 \
             ORDER BY transaction_date DESC, id DESC LIMIT ?2",
            TRANSACTION_COLUMNS
        );

        let rows = sqlx::query_as::<_, CustomerTransaction>(&sql)
            .bind(customer_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Latest transactions with a display running balance, newest first.
    pub async fn running_history(&self, customer_id: i64, limit: u32) -> DbResult<Vec<HistoryEntry>> {
        let rows = self.transactions(customer_id, limit).await?;
        Ok(running_history(rows))
    }
}

fn posting_with(
    customer_id: i64,
    transaction_type: TransactionType,
    amount: Money,
    description: Option<&str>,
    reference: Option<&str>,
) -> Posting {
    let mut posting = Posting::new(customer_id, transaction_type, amount);
    posting.description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    posting.reference_number = reference.map(str::to_string);
    posting
}

/// Default description when the operator leaves it blank.
fn default_description(transaction_type: TransactionType) -> String {
    let kind = match transaction_type {
        TransactionType::Sale => "Sale",
        TransactionType::Payment => "Payment",
        TransactionType::Credit => "Credit",
        TransactionType::Debit => "Debit",
    };
    format!("{} transaction", kind)
}

/// Applies one posting on an open connection or transaction.
pub(crate) async fn post_in(
    conn: &mut SqliteConnection,
    posting: &Posting,
    at: DateTime<Utc>,
) -> DbResult<CustomerTransaction> {
    let delta = balance_delta(posting.transaction_type, posting.amount)?;

    let result = if posting.transaction_type == TransactionType::Sale {
        sqlx::query(
            r#"
            UPDATE customers SET
                current_balance_cents = current_balance_cents + ?2,
                total_purchases_cents = total_purchases_cents + ?3,
                last_purchase_date = ?4
            WHERE id = ?1
            "#,
        )
        .bind(posting.customer_id)
        .bind(delta.cents())
        .bind(posting.amount.cents())
        .bind(at)
        .execute(&mut *conn)
        .await?
    } else {
        sqlx::query(
            "UPDATE customers SET current_balance_cents = current_balance_cents + ?2 WHERE id = ?1",
        )
        .bind(posting.customer_id)
        .bind(delta.cents())
        .execute(&mut *conn)
        .await?
    };

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", posting.customer_id));
    }

    let description = posting
        .description
        .clone()
        .unwrap_or_else(|| default_description(posting.transaction_type));
    let created_by = posting
        .created_by
        .clone()
        .unwrap_or_else(|| DEFAULT_OPERATOR.to_string());

    let inserted = sqlx::query(
        r#"
        INSERT INTO customer_transactions (
            customer_id, transaction_type, amount_cents, description,
            reference_number, transaction_date, created_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(posting.customer_id)
    .bind(posting.transaction_type)
    .bind(posting.amount.cents())
    .bind(&description)
    .bind(&posting.reference_number)
    .bind(at)
    .bind(&created_by)
    .execute(&mut *conn)
    .await?;

    info!(
        customer_id = posting.customer_id,
        transaction_type = %posting.transaction_type,
        amount = %posting.amount,
        balance_delta = %delta,
        "Customer posting recorded"
    );

    Ok(CustomerTransaction {
        id: inserted.last_insert_rowid(),
        customer_id: posting.customer_id,
        transaction_type: posting.transaction_type,
        amount_cents: posting.amount.cents(),
        description: Some(description),
        reference_number: posting.reference_number.clone(),
        transaction_date: at,
        created_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use till_core::CustomerType;

    async fn db_with_customer() -> (Database, Customer) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db
            .customers()
            .insert(&NewCustomer {
                name: "Bilal Ahmed".to_string(),
                contact_number: Some("0300-1234567".to_string()),
                company_name: Some("Ahmed Traders".to_string()),
                customer_type: CustomerType::Wholesale,
                credit_limit_cents: 100_000,
                ..Default::default()
            })
            .await
            .unwrap();
        (db, customer)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (db, customer) = db_with_customer().await;

        let loaded = db.customers().get(customer.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Bilal Ahmed");
        assert_eq!(loaded.customer_type, CustomerType::Wholesale);
        assert_eq!(loaded.current_balance(), Money::zero());
        assert!(db.customers().get(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_by_company_and_contact() {
        let (db, _) = db_with_customer().await;

        assert_eq!(db.customers().search("traders", 10).await.unwrap().len(), 1);
        assert_eq!(db.customers().search("0300", 10).await.unwrap().len(), 1);
        assert!(db.customers().search("nobody", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_wildcards_match_literally() {
        let (db, _) = db_with_customer().await;
        db.customers()
            .insert(&NewCustomer {
                name: "Shop_100%".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let hits = db.customers().search("%", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Shop_100%");

        let hits = db.customers().search("p_1", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(db.customers().search("h_d", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_reduces_balance() {
        let (db, customer) = db_with_customer().await;
        let ledger = db.customers();

        ledger
            .post_sale(customer.id, Money::from_cents(5000), Some("R1"))
            .await
            .unwrap();
        let payment = ledger
            .post_payment(customer.id, Money::from_cents(2000), None, None)
            .await
            .unwrap();

        assert_eq!(payment.description.as_deref(), Some("Payment transaction"));

        let loaded = ledger.get(customer.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_balance_cents, 3000);
        assert_eq!(loaded.total_purchases_cents, 5000);
        assert!(loaded.last_purchase_date.is_some());
    }

    #[tokio::test]
    async fn test_credit_and_debit_directions() {
        let (db, customer) = db_with_customer().await;
        let ledger = db.customers();

        ledger
            .post_debit(customer.id, Money::from_cents(1500), Some("Delivery charge"), None)
            .await
            .unwrap();
        ledger
            .post_credit(customer.id, Money::from_cents(2000), Some("Goodwill"), None)
            .await
            .unwrap();

        let loaded = ledger.get(customer.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_balance_cents, -500);
        // only SALE counts as a purchase
        assert_eq!(loaded.total_purchases_cents, 0);
    }

    #[tokio::test]
    async fn test_invalid_amount_and_unknown_customer() {
        let (db, customer) = db_with_customer().await;
        let ledger = db.customers();

        let err = ledger
            .post_payment(customer.id, Money::zero(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::InvalidAmount { .. })));

        let err = ledger
            .post_credit(4242, Money::from_cents(100), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        assert!(ledger.transactions(customer.id, 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_running_history() {
        let (db, customer) = db_with_customer().await;
        let ledger = db.customers();

        ledger.post_sale(customer.id, Money::from_cents(5000), None).await.unwrap();
        ledger
            .post_payment(customer.id, Money::from_cents(2000), None, None)
            .await
            .unwrap();
        ledger
            .post_credit(customer.id, Money::from_cents(500), None, None)
            .await
            .unwrap();

        let history = ledger
            .running_history(customer.id, DEFAULT_HISTORY_LIMIT)
            .await
            .unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].transaction.transaction_type, TransactionType::Credit);
        assert_eq!(history[0].running_balance.cents(), 2500);
        assert_eq!(history[2].running_balance.cents(), 5000);
    }
}
