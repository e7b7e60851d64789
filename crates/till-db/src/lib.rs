//! # till-db: Storage for Till POS
//!
//! SQLite persistence for the catalog, both ledgers and recorded sales,
//! plus the checkout commit that ties them together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Data Flow                               │
//! │                                                                         │
//! │  till-terminal (CheckoutSession)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Checkout    │  │   │
//! │  │   │   (pool.rs)   │    │               │    │              │  │   │
//! │  │   │               │    │ Products      │    │ one tx:      │  │   │
//! │  │   │ SqlitePool    │◄───│ Inventory     │◄───│ stock, sale, │  │   │
//! │  │   │ Migrations    │    │ Customers     │    │ customer     │  │   │
//! │  │   │               │    │ Sales         │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("till.db")).await?;
//!
//! let product = db.products().find_by_barcode("8964000123456").await?;
//! let committed = db.checkout().commit(&mut order, "Ayesha").await?;
//! ```

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use checkout::{Checkout, CommittedSale};
pub use error::{CheckoutError, CheckoutResult, DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::{CustomerRepository, Posting};
pub use repository::inventory::{InventoryRepository, MovementFilter, StockAdjustment};
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
