//! End-to-end checkout against an in-memory database.

use chrono::Utc;
use rust_decimal_macros::dec;
use till_core::{
    CoreError, CustomerRef, MovementType, Money, NewCustomer, NewProduct, Order, OrderState,
    Product, Quantity, TaxRate, TransactionType,
};
use till_db::{CheckoutError, Database, DbConfig, DbError, MovementFilter};

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn product(db: &Database, barcode: &str, price_cents: i64, quantity: i64) -> Product {
    db.products()
        .insert(&NewProduct {
            barcode: barcode.to_string(),
            name: format!("Item {}", barcode),
            sale_price_cents: price_cents,
            quantity,
            min_stock_threshold: 2,
        })
        .await
        .unwrap()
}

async fn customer(db: &Database, name: &str) -> CustomerRef {
    let c = db
        .customers()
        .insert(&NewCustomer {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    CustomerRef {
        id: c.id,
        name: c.name,
    }
}

fn untaxed_order() -> Order {
    Order::with_tax_default(TaxRate::default(), false)
}

async fn stock(db: &Database, id: i64) -> i64 {
    db.products().get_by_id(id).await.unwrap().unwrap().quantity
}

#[tokio::test]
async fn commit_decrements_stock_and_records_out_movement() {
    let db = setup().await;
    let p = product(&db, "1001", 1000, 10).await;

    let mut order = untaxed_order();
    order.add_item(&p, Quantity::from_units(3)).unwrap();
    order.begin_payment(Money::from_cents(5000)).unwrap();

    let committed = db.checkout().commit(&mut order, "Ayesha").await.unwrap();

    assert_eq!(order.state(), OrderState::Committed);
    assert_eq!(stock(&db, p.id).await, 7);

    let movements = db
        .inventory()
        .history(&MovementFilter {
            product_id: Some(p.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Out);
    assert_eq!(movements[0].quantity_change, -3);
    assert_eq!(movements[0].new_quantity, 7);
    assert_eq!(
        movements[0].reference_number.as_deref(),
        Some(committed.sale.receipt_number.as_str())
    );

    assert_eq!(committed.sale.total_cents, 3000);
    assert_eq!(committed.sale.change_cents, 2000);
    assert_eq!(committed.sale.cashier, "Ayesha");
    assert_eq!(committed.lines.len(), 1);
}

#[tokio::test]
async fn commit_posts_sale_to_attached_customer() {
    let db = setup().await;
    let p = product(&db, "2002", 1000, 20).await;
    let c = customer(&db, "Sana Malik").await;

    let mut order = untaxed_order();
    order.add_item(&p, Quantity::from_units(5)).unwrap();
    order.attach_customer(c.clone()).unwrap();
    order.begin_payment(Money::from_cents(5000)).unwrap();

    let committed = db.checkout().commit(&mut order, "Ayesha").await.unwrap();
    assert_eq!(committed.sale.customer_id, Some(c.id));
    assert_eq!(committed.sale.customer_name.as_deref(), Some("Sana Malik"));

    let account = db.customers().get(c.id).await.unwrap().unwrap();
    assert_eq!(account.current_balance_cents, 5000);
    assert_eq!(account.total_purchases_cents, 5000);
    assert!(account.last_purchase_date.is_some());

    let rows = db.customers().transactions(c.id, 50).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].transaction_type, TransactionType::Sale);
    assert_eq!(rows[0].amount_cents, 5000);
    assert_eq!(rows[0].description.as_deref(), Some("POS Sale - 1 items"));
    assert_eq!(
        rows[0].reference_number.as_deref(),
        Some(committed.sale.receipt_number.as_str())
    );
}

#[tokio::test]
async fn payment_after_sale_reduces_balance() {
    let db = setup().await;
    let p = product(&db, "3003", 2500, 20).await;
    let c = customer(&db, "Bilal Ahmed").await;

    let mut order = untaxed_order();
    order.add_item(&p, Quantity::from_units(2)).unwrap();
    order.attach_customer(c.clone()).unwrap();
    order.begin_payment(Money::zero()).unwrap();
    db.checkout().commit(&mut order, "Ayesha").await.unwrap();

    db.customers()
        .post_payment(c.id, Money::from_cents(2000), None, None)
        .await
        .unwrap();

    let account = db.customers().get(c.id).await.unwrap().unwrap();
    assert_eq!(account.current_balance_cents, 3000);
}

#[tokio::test]
async fn second_commit_is_rejected_without_double_posting() {
    let db = setup().await;
    let p = product(&db, "4004", 1000, 10).await;
    let c = customer(&db, "Usman Sheikh").await;

    let mut order = untaxed_order();
    order.add_item(&p, Quantity::from_units(1)).unwrap();
    order.attach_customer(c.clone()).unwrap();
    order.begin_payment(Money::from_cents(1000)).unwrap();

    db.checkout().commit(&mut order, "Ayesha").await.unwrap();
    let err = db.checkout().commit(&mut order, "Ayesha").await.unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Order(CoreError::InvalidState {
            state: OrderState::Committed,
            ..
        })
    ));
    assert_eq!(stock(&db, p.id).await, 9);
    assert_eq!(db.sales().count().await.unwrap(), 1);
    assert_eq!(db.customers().transactions(c.id, 50).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_line_rolls_back_everything() {
    let db = setup().await;
    let p = product(&db, "5005", 1000, 10).await;

    let ghost = Product {
        id: 9_999,
        barcode: "GHOST".to_string(),
        name: "Deleted product".to_string(),
        sale_price_cents: 500,
        quantity: 0,
        min_stock_threshold: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let mut order = untaxed_order();
    order.add_item(&p, Quantity::from_units(4)).unwrap();
    order.add_item(&ghost, Quantity::from_units(1)).unwrap();
    order.begin_payment(Money::from_cents(10000)).unwrap();

    let err = db.checkout().commit(&mut order, "Ayesha").await.unwrap_err();

    match err {
        CheckoutError::CommitFailed { source, .. } => {
            assert!(matches!(source, DbError::NotFound { .. }))
        }
        other => panic!("expected CommitFailed, got {:?}", other),
    }
    assert_eq!(order.state(), OrderState::AwaitingPayment);
    assert_eq!(stock(&db, p.id).await, 10);
    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert!(db
        .inventory()
        .history(&MovementFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unknown_customer_rolls_back_stock_and_sale() {
    let db = setup().await;
    let p = product(&db, "6006", 1000, 10).await;

    let mut order = untaxed_order();
    order.add_item(&p, Quantity::from_units(2)).unwrap();
    order
        .attach_customer(CustomerRef {
            id: 4_242,
            name: "Nobody".to_string(),
        })
        .unwrap();
    order.begin_payment(Money::from_cents(2000)).unwrap();

    let err = db.checkout().commit(&mut order, "Ayesha").await.unwrap_err();

    assert!(matches!(err, CheckoutError::CommitFailed { .. }));
    assert_eq!(order.state(), OrderState::AwaitingPayment);
    assert_eq!(stock(&db, p.id).await, 10);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn zero_total_skips_customer_posting() {
    let db = setup().await;
    let p = product(&db, "7007", 1000, 10).await;
    let c = customer(&db, "Comp Guest").await;

    let mut order = untaxed_order();
    order.add_item(&p, Quantity::from_units(1)).unwrap();
    order.set_percentage_discount(dec!(100)).unwrap();
    order.attach_customer(c.clone()).unwrap();
    order.begin_payment(Money::zero()).unwrap();

    let committed = db.checkout().commit(&mut order, "Ayesha").await.unwrap();

    assert_eq!(committed.sale.total_cents, 0);
    assert_eq!(stock(&db, p.id).await, 9);
    assert!(db.customers().transactions(c.id, 50).await.unwrap().is_empty());
    assert_eq!(
        db.customers().get(c.id).await.unwrap().unwrap().current_balance_cents,
        0
    );
}

#[tokio::test]
async fn checkout_sale_out_can_drive_stock_negative() {
    let db = setup().await;
    let p = product(&db, "8008", 1000, 1).await;

    let mut order = untaxed_order();
    order.add_item(&p, Quantity::from_hundredths(250)).unwrap();
    order.begin_payment(Money::from_cents(2500)).unwrap();

    let committed = db.checkout().commit(&mut order, "Ayesha").await.unwrap();

    // 2.50 consumes three whole units
    assert_eq!(stock(&db, p.id).await, -2);
    assert_eq!(committed.lines[0].quantity_hundredths, 250);
    assert_eq!(committed.sale.total_cents, 2500);
}

#[tokio::test]
async fn taxed_order_records_rounded_totals() {
    let db = setup().await;
    let p = product(&db, "9009", 1999, 10).await;

    let mut order = Order::new(TaxRate::default());
    order.add_item(&p, Quantity::from_units(3)).unwrap();
    order.begin_payment(Money::from_cents(10000)).unwrap();

    let committed = db.checkout().commit(&mut order, "Ayesha").await.unwrap();
    let sale = db
        .sales()
        .get_by_receipt(&committed.sale.receipt_number)
        .await
        .unwrap()
        .unwrap();

    // 59.97 + 15% = 8.9955 tax
    assert_eq!(sale.subtotal_cents, 5997);
    assert_eq!(sale.tax_cents, 900);
    assert_eq!(sale.total_cents, 6897);
    assert_eq!(sale.change_cents, 3103);
}
