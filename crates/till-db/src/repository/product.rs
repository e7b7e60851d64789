//! # Product Repository (Catalog Lookup)
//!
//! Resolves scan codes and free-text queries to products.
//!
//! ## Lookup Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog Lookup                                       │
//! │                                                                         │
//! │  Scanner / Enter key ──► find_by_barcode("8964000123456")              │
//! │                             exact match, Ok(None) on a miss            │
//! │                                                                         │
//! │  Search box ──────────► search("milk", 20)                             │
//! │                             LIKE '%milk%' on name OR barcode,          │
//! │                             case-insensitive, ORDER BY name            │
//! │                                                                         │
//! │  Product grid ────────► list_page(16, page)                            │
//! │                             ORDER BY name, LIMIT/OFFSET                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A miss is `Ok(None)` / an empty `Vec`, never an error. Only a failing
//! store produces `Err`.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::escape_like;
use crate::error::{DbError, DbResult};
use till_core::validation::{
    validate_barcode, validate_price_cents, validate_product_name, validate_search_query,
};
use till_core::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, barcode, name, sale_price_cents, quantity, \
                               min_stock_threshold, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let hit = repo.find_by_barcode("8964000123456").await?;
/// let results = repo.search("milk", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Exact barcode match.
    pub async fn find_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let barcode = barcode.trim();
        debug!(barcode = %barcode, "Looking up barcode");

        let sql = format!("SELECT {} FROM products WHERE barcode = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Case-insensitive substring search over name and barcode.
    ///
    /// An empty query returns the first `limit` products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query).map_err(till_core::CoreError::from)?;

        debug!(query = %query, limit = limit, "Searching products");

        if query.is_empty() {
            return self.list_page(limit, 0).await;
        }

        let pattern = format!("%{}%", escape_like(&query));
        let sql = format!(
            "SELECT {} FROM products \
             WHERE name LIKE ?1 ESCAPE '\\' OR barcode LIKE ?1 ESCAPE '\\' \
             ORDER BY name LIMIT ?2",
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// One page of the catalog ordered by name. `page` is zero-based.
    pub async fn list_page(&self, page_size: u32, page: u32) -> DbResult<Vec<Product>> {
        let offset = i64::from(page_size) * i64::from(page);
        let sql = format!(
            "SELECT {} FROM products ORDER BY name, id LIMIT ?1 OFFSET ?2",
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Products at or below their low-stock threshold, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE quantity <= min_stock_threshold \
             ORDER BY quantity, name",
            PRODUCT_COLUMNS
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its id
    /// * `Err(DbError::UniqueViolation)` - Barcode already exists
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_barcode(&product.barcode).map_err(till_core::CoreError::from)?;
        validate_product_name(&product.name).map_err(till_core::CoreError::from)?;
        validate_price_cents(product.sale_price_cents).map_err(till_core::CoreError::from)?;

        debug!(barcode = %product.barcode, "Inserting product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                barcode, name, sale_price_cents, quantity, min_stock_threshold,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(product.barcode.trim())
        .bind(product.name.trim())
        .bind(product.sale_price_cents)
        .bind(product.quantity)
        .bind(product.min_stock_threshold)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, product.barcode.trim())
            }
            other => other,
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Counts catalog products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (compose inside a transaction)
// =============================================================================

pub(crate) async fn fetch_by_id(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

pub(crate) async fn write_quantity(
    conn: &mut SqliteConnection,
    id: i64,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE products SET quantity = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        for (barcode, name, price) in [
            ("8964000123456", "Olpers Milk 1L", 28000),
            ("8964000654321", "Nestle Milkpak 250ml", 9000),
            ("5000112637922", "Coca-Cola 330ml", 12000),
            ("100_PCT", "Tapal Danedar 100%", 45000),
        ] {
            repo.insert(&NewProduct {
                barcode: barcode.to_string(),
                name: name.to_string(),
                sale_price_cents: price,
                quantity: 10,
                min_stock_threshold: 3,
            })
            .await
            .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_find_by_barcode_hit_and_miss() {
        let db = seeded().await;

        let hit = db.products().find_by_barcode("5000112637922").await.unwrap();
        assert_eq!(hit.unwrap().name, "Coca-Cola 330ml");

        let miss = db.products().find_by_barcode("0000000000000").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_sorted() {
        let db = seeded().await;

        let results = db.products().search("MILK", 20).await.unwrap();
        let names: Vec<_> = results.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Nestle Milkpak 250ml", "Olpers Milk 1L"]);

        let by_code = db.products().search("637922", 20).await.unwrap();
        assert_eq!(by_code.len(), 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let db = seeded().await;

        let results = db.products().search("100%", 20).await.unwrap();
        assert_eq!(results.len(), 1);

        let results = db.products().search("_", 20).await.unwrap();
        assert_eq!(results[0].barcode, "100_PCT");
    }

    #[tokio::test]
    async fn test_list_page() {
        let db = seeded().await;

        let first = db.products().list_page(3, 0).await.unwrap();
        let second = db.products().list_page(3, 1).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first[0].name, "Coca-Cola 330ml");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "Tapal Danedar 100%");
    }

    #[tokio::test]
    async fn test_duplicate_barcode_conflict() {
        let db = seeded().await;

        let err = db
            .products()
            .insert(&NewProduct {
                barcode: "5000112637922".to_string(),
                name: "Duplicate".to_string(),
                sale_price_cents: 100,
                quantity: 0,
                min_stock_threshold: 0,
            })
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "5000112637922"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }
}
