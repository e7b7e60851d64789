//! # Database Handle
//!
//! One terminal owns one SQLite file. The pool exists so receipt look-ups
//! and history reads can run while a checkout transaction is open.
//!
//! ## Pool Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new(path)      file pool, WAL journal                        │
//! │    max_connections         from [database] in till.toml                 │
//! │    acquire_timeout         how long a command waits for a connection    │
//! │    idle_timeout            idle connections closed after this           │
//! │                                                                         │
//! │  DbConfig::in_memory()    one connection, never closed while open      │
//! │                           (a second connection would see an empty DB)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every handle runs the embedded migrations on open, so a fresh file is
//! ready for `scan` as soon as `Database::new` returns.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::checkout::Checkout;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;

const MEMORY_PATH: &str = ":memory:";

/// Where the till's database lives and how its pool is sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// `None` keeps idle connections open.
    pub idle_timeout: Option<Duration>,
}

impl DbConfig {
    /// File-backed database, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }

    /// Private database for tests and the demo session. Lives as long as
    /// the single pooled connection does.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: None,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        Ok(options.foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);

        if self.is_in_memory() {
            // Dropping the last connection drops the data.
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options
                .max_connections(self.max_connections)
                .idle_timeout(self.idle_timeout)
        }
    }
}

/// Handle to the till's database. Clones share the pool.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./till.db")).await?;
/// let hit = db.products().find_by_barcode("8964000123456").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening database"
        );

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(in_memory = config.is_in_memory(), "Pool connected");

        let db = Database { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Applies any embedded migration not yet recorded. Safe to repeat.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        let (embedded, applied) = migrations::migration_status(&self.pool).await?;
        debug!(embedded, applied, "Schema up to date");
        Ok(())
    }

    /// Raw pool, for work that spans repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Catalog Lookup.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Commits a paid order across the sale, stock and customer ledgers.
    pub fn checkout(&self) -> Checkout {
        Checkout::new(self.pool.clone())
    }

    /// Waits for open connections to finish, then closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_has_ledger_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for table in [
            "products",
            "customers",
            "customer_transactions",
            "stock_movements",
            "sales",
            "sale_items",
        ] {
            let found: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            )
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert_eq!(found, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_in_memory_pool_ignores_sizing() {
        let config = DbConfig::in_memory()
            .max_connections(8)
            .idle_timeout(Some(Duration::from_secs(1)));
        let db = Database::new(config).await.unwrap();

        // A second connection would open a separate, empty database.
        assert_eq!(db.pool().options().get_max_connections(), 1);
        assert_eq!(db.pool().options().get_idle_timeout(), None);
    }

    #[tokio::test]
    async fn test_file_pool_uses_config() {
        let dir = std::env::temp_dir().join(format!("till-pool-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("till.db");

        let config = DbConfig::new(&path)
            .max_connections(3)
            .acquire_timeout(Duration::from_secs(2))
            .idle_timeout(None);
        let db = Database::new(config).await.unwrap();

        assert!(path.exists());
        assert_eq!(db.pool().options().get_max_connections(), 3);
        assert_eq!(db.pool().options().get_acquire_timeout(), Duration::from_secs(2));
        assert_eq!(db.pool().options().get_idle_timeout(), None);

        db.close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/till-test.db")
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(600)));
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
