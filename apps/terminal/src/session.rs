//! # Checkout Session
//!
//! Owns the terminal's single open [`Order`] and runs operator commands
//! against it and the database.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutSession                                                       │
//! │  ├── db: Database           shared pool, repositories, checkout        │
//! │  ├── config: TerminalConfig operator, tax default, page sizes          │
//! │  └── order: Order           the one open order                         │
//! │                                                                         │
//! │  commit ok ──► order replaced with a fresh empty Order                 │
//! │  commit err ─► order untouched, still AwaitingPayment                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands run one at a time; there is no other writer on this terminal.

use serde::Serialize;
use tracing::{info, warn};

use till_core::account::HistoryEntry;
use till_core::{
    Customer, CustomerRef, CustomerTransaction, InventoryMovement, Money, Order, OrderSummary,
    PaymentStatus, Product, Quantity, Sale, SaleLine,
};
use till_db::repository::customer::DEFAULT_HISTORY_LIMIT;
use till_db::{
    CheckoutError, CommittedSale, Database, MovementFilter, Posting, StockAdjustment,
};

use crate::command::{Command, HELP};
use crate::config::TerminalConfig;
use crate::error::{TerminalError, TerminalResult};

/// Result of one command, printed as JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Reply {
    Order(OrderSummary),
    Payment {
        status: PaymentStatus,
        order: OrderSummary,
    },
    Committed {
        committed: CommittedSale,
        partial_payment: bool,
    },
    Products(Vec<ProductRow>),
    Customers(Vec<Customer>),
    Receipt {
        sale: Sale,
        lines: Vec<SaleLine>,
        partial_payment: bool,
    },
    Transaction {
        transaction: CustomerTransaction,
        balance: Money,
    },
    History(Vec<HistoryEntry>),
    Movement(InventoryMovement),
    Movements(Vec<InventoryMovement>),
    Help(&'static str),
    Bye,
}

/// Catalog row as listed to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRow {
    #[serde(flatten)]
    pub product: Product,
    /// Stock at or below the product's warning level.
    pub low_stock: bool,
}

impl From<Product> for ProductRow {
    fn from(product: Product) -> Self {
        ProductRow {
            low_stock: product.is_low_stock(),
            product,
        }
    }
}

fn product_rows(products: Vec<Product>) -> Reply {
    Reply::Products(products.into_iter().map(ProductRow::from).collect())
}

/// One operator's checkout session.
pub struct CheckoutSession {
    db: Database,
    config: TerminalConfig,
    order: Order,
}

impl CheckoutSession {
    pub fn new(db: Database, config: TerminalConfig) -> Self {
        let order = fresh_order(&config);
        CheckoutSession { db, config, order }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    fn operator(&self) -> &str {
        &self.config.store.operator
    }

    /// Runs one command.
    ///
    /// A failed command leaves the order exactly as it was.
    pub async fn execute(&mut self, command: Command) -> TerminalResult<Reply> {
        match command {
            Command::Scan { barcode, quantity } => self.scan(&barcode, quantity).await,
            Command::Add {
                product_id,
                quantity,
            } => self.add_by_id(product_id, quantity).await,
            Command::Search { query } => {
                let products = self
                    .db
                    .products()
                    .search(&query, self.config.catalog.search_limit)
                    .await?;
                Ok(product_rows(products))
            }
            Command::Page { page } => {
                let products = self
                    .db
                    .products()
                    .list_page(self.config.catalog.page_size, page)
                    .await?;
                Ok(product_rows(products))
            }
            Command::LowStock => Ok(product_rows(self.db.products().low_stock().await?)),
            Command::SetQuantity { line, quantity } => {
                self.order.set_quantity(line, quantity)?;
                self.summary()
            }
            Command::Remove { line } => {
                self.order.remove_item(line)?;
                self.summary()
            }
            Command::Void => {
                let voided = self.order.void_last_item()?;
                info!(barcode = %voided.barcode, "Voided last item");
                self.summary()
            }
            Command::DiscountPercent(pct) => {
                self.order.set_percentage_discount(pct)?;
                self.summary()
            }
            Command::DiscountFixed(amount) => {
                self.order.set_fixed_discount(amount)?;
                self.summary()
            }
            Command::DiscountOff => {
                self.order.clear_discount()?;
                self.summary()
            }
            Command::Tax(enabled) => {
                self.order.set_tax_enabled(enabled)?;
                self.summary()
            }
            Command::AttachCustomer(id) => self.attach_customer(id).await,
            Command::DetachCustomer => {
                self.order.detach_customer()?;
                self.summary()
            }
            Command::FindCustomer { query } => {
                let customers = self
                    .db
                    .customers()
                    .search(&query, self.config.catalog.search_limit)
                    .await?;
                Ok(Reply::Customers(customers))
            }
            Command::Pay(amount) => self.begin_payment(amount),
            Command::Abort => {
                self.order.abort_payment()?;
                self.summary()
            }
            Command::Commit => self.commit().await,
            Command::Cancel => {
                self.order.cancel()?;
                self.summary()
            }
            Command::NewOrder => {
                self.order.reset()?;
                self.summary()
            }
            Command::Show => self.summary(),
            Command::Receipt { receipt_number } => self.receipt(&receipt_number).await,
            Command::Post {
                transaction_type,
                customer_id,
                amount,
                description,
            } => {
                let mut posting = Posting::new(customer_id, transaction_type, amount)
                    .created_by(self.operator());
                posting.description = description;

                let transaction = self.db.customers().post(&posting).await?;
                let balance = self
                    .db
                    .customers()
                    .get(customer_id)
                    .await?
                    .map(|c| c.current_balance())
                    .unwrap_or_default();

                Ok(Reply::Transaction {
                    transaction,
                    balance,
                })
            }
            Command::History { customer_id } => {
                if self.db.customers().get(customer_id).await?.is_none() {
                    return Err(TerminalError::not_found("Customer", customer_id));
                }
                let history = self
                    .db
                    .customers()
                    .running_history(customer_id, DEFAULT_HISTORY_LIMIT)
                    .await?;
                Ok(Reply::History(history))
            }
            Command::Stock {
                product_id,
                change,
                reason,
            } => {
                let adjustment =
                    StockAdjustment::new(product_id, change, reason).created_by(self.operator());
                let movement = self.db.inventory().apply(&adjustment).await?;
                Ok(Reply::Movement(movement))
            }
            Command::Movements {
                product_id,
                from,
                to,
            } => {
                let filter = MovementFilter {
                    product_id,
                    from,
                    to,
                };
                Ok(Reply::Movements(self.db.inventory().history(&filter).await?))
            }
            Command::Help => Ok(Reply::Help(HELP)),
            Command::Quit => Ok(Reply::Bye),
        }
    }

    async fn scan(&mut self, barcode: &str, quantity: Quantity) -> TerminalResult<Reply> {
        let product = self
            .db
            .products()
            .find_by_barcode(barcode)
            .await
            .map_err(catalog_failure)?
            .ok_or_else(|| TerminalError::not_found("Product", barcode.trim()))?;

        self.add_product(&product, quantity)
    }

    async fn add_by_id(&mut self, product_id: i64, quantity: Quantity) -> TerminalResult<Reply> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await
            .map_err(catalog_failure)?
            .ok_or_else(|| TerminalError::not_found("Product", product_id))?;

        self.add_product(&product, quantity)
    }

    fn add_product(&mut self, product: &Product, quantity: Quantity) -> TerminalResult<Reply> {
        self.order.add_item(product, quantity)?;
        if product.is_low_stock() {
            warn!(
                barcode = %product.barcode,
                on_hand = product.quantity,
                threshold = product.min_stock_threshold,
                "Selling a low-stock product"
            );
        }
        self.summary()
    }

    async fn attach_customer(&mut self, id: i64) -> TerminalResult<Reply> {
        let customer = self
            .db
            .customers()
            .get(id)
            .await?
            .ok_or_else(|| TerminalError::not_found("Customer", id))?;

        if customer.is_over_credit_limit() {
            warn!(
                customer_id = customer.id,
                balance = %customer.current_balance(),
                limit = %customer.credit_limit(),
                "Customer is over credit limit"
            );
        }

        self.order.attach_customer(CustomerRef {
            id: customer.id,
            name: customer.name,
        })?;
        self.summary()
    }

    fn begin_payment(&mut self, amount: Money) -> TerminalResult<Reply> {
        let status = self.order.begin_payment(amount)?;
        if let Some(shortfall) = status.shortfall {
            warn!(
                total = %status.total,
                tendered = %status.tendered,
                shortfall = %shortfall,
                "Partial payment"
            );
        }

        Ok(Reply::Payment {
            status,
            order: self.order.summary()?,
        })
    }

    async fn commit(&mut self) -> TerminalResult<Reply> {
        let checkout = self.db.checkout();
        let operator = self.config.store.operator.clone();

        match checkout.commit(&mut self.order, &operator).await {
            Ok(committed) => {
                self.order = fresh_order(&self.config);
                let partial_payment = committed.sale.is_partial_payment();
                info!(
                    receipt_number = %committed.sale.receipt_number,
                    total = %committed.sale.total(),
                    change = %committed.sale.change(),
                    partial_payment,
                    "Order closed"
                );
                Ok(Reply::Committed {
                    committed,
                    partial_payment,
                })
            }
            Err(err @ CheckoutError::CommitFailed { .. }) => {
                warn!(state = %self.order.state(), "Order kept for retry");
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn receipt(&self, receipt_number: &str) -> TerminalResult<Reply> {
        let sales = self.db.sales();
        let sale = sales
            .get_by_receipt(receipt_number)
            .await?
            .ok_or_else(|| TerminalError::not_found("Receipt", receipt_number))?;
        let lines = sales.get_lines(sale.id).await?;

        Ok(Reply::Receipt {
            partial_payment: sale.is_partial_payment(),
            sale,
            lines,
        })
    }

    fn summary(&self) -> TerminalResult<Reply> {
        Ok(Reply::Order(self.order.summary()?))
    }
}

fn fresh_order(config: &TerminalConfig) -> Order {
    Order::with_tax_default(
        config.pricing.tax_rate(),
        config.pricing.tax_enabled_by_default,
    )
}

fn catalog_failure(err: till_db::DbError) -> TerminalError {
    if err.is_storage_failure() {
        CheckoutError::CatalogUnavailable(err).into()
    } else {
        err.into()
    }
}
