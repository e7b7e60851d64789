//! # Repository Module
//!
//! One repository per ledger, each a thin handle around the shared pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.products()   ProductRepository     Catalog Lookup                  │
//! │  db.inventory()  InventoryRepository   stock + stock_movements         │
//! │  db.customers()  CustomerRepository    balances + transactions         │
//! │  db.sales()      SaleRepository        sales + sale_items (read side)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each module also exposes `pub(crate)` helpers that take a
//! `&mut SqliteConnection`, so [`crate::checkout`] can run steps from
//! several repositories inside one transaction.

pub mod customer;
pub mod inventory;
pub mod product;
pub mod sale;

/// Escapes LIKE wildcards so operator input matches literally. Pair with
/// `ESCAPE '\'` in the query.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
